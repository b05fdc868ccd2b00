//! Trunk radius from cross-section morphology.
//!
//! Morphology measurements give an equivalent diameter per image slice
//! at the nerve's centroid. Each trunk point borrows the radius of its
//! nearest measurement.

use serde::{Deserialize, Serialize};

use crate::matcher::PointIndex;
use crate::types::Point;

/// One cross-section measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MorphologySample {
    /// Section centroid.
    pub point: Point,
    /// Half the equivalent diameter.
    pub radius: f64,
}

/// Radius per trunk point and their average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkRadius {
    /// One radius per trunk point, in trunk order.
    pub per_point: Vec<f64>,
    /// Mean of `per_point`.
    pub average: f64,
}

impl TrunkRadius {
    /// Default radius for branches: half the average trunk radius.
    #[must_use]
    pub fn branch_radius(&self) -> f64 {
        self.average / 2.0
    }
}

/// Assign each trunk point the radius of its nearest sample.
///
/// Equidistant samples resolve to the later one. Returns `None` when
/// either input is empty.
#[must_use]
pub fn assign_trunk_radius(trunk: &[Point], samples: &[MorphologySample]) -> Option<TrunkRadius> {
    if trunk.is_empty() || samples.is_empty() {
        return None;
    }
    let centres: Vec<Point> = samples.iter().map(|s| s.point).collect();
    let index = PointIndex::new(&centres);

    let per_point = trunk
        .iter()
        .map(|&p| index.nearest(p).map(|(i, _)| samples[i].radius))
        .collect::<Option<Vec<f64>>>()?;

    #[allow(clippy::cast_precision_loss)]
    let average = per_point.iter().sum::<f64>() / per_point.len() as f64;

    Some(TrunkRadius { per_point, average })
}
