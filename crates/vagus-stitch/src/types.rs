//! Shared types for the vagus stitching core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 3D point in image-stack coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Column position within a slice.
    pub x: f64,
    /// Row position within a slice.
    pub y: f64,
    /// Slice (frame) position along the stack.
    pub z: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Summed in the same order as the spatial index's metric so both
    /// agree to the last bit.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Coordinates as an `[x, y, z]` array, the layout spatial indexes expect.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// An ordered sequence of traced points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// A new polyline without the first point, optionally reversed.
    ///
    /// This is the stitching transform: the dropped head duplicates the
    /// parent point the branch was traced from, and reversal makes the
    /// sequence run outward from the parent.
    #[must_use]
    pub fn stitched(&self, reverse: bool) -> Self {
        let mut points: Vec<Point> = self.0.iter().skip(1).copied().collect();
        if reverse {
            points.reverse();
        }
        Self(points)
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

/// Anatomical side of a segment or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left side of the body.
    Left,
    /// Right side of the body.
    Right,
}

impl Side {
    /// Lower-case label used inside structure names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Side implied by a structure name: `left` when the name mentions
    /// it, `right` otherwise.
    #[must_use]
    pub fn from_structure_name(name: &str) -> Self {
        if name.contains("left") {
            Self::Left
        } else {
            Self::Right
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single digitized polyline representing one anatomical structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Structure name as recorded by the tracer.
    pub name: String,
    /// Side of the segment the trace belongs to.
    pub side: Side,
    /// Traced points in recording order.
    pub points: Polyline,
}

impl Trace {
    /// Create a new trace.
    #[must_use]
    pub fn new(name: impl Into<String>, side: Side, points: impl Into<Polyline>) -> Self {
        Self {
            name: name.into(),
            side,
            points: points.into(),
        }
    }
}

/// A named landmark independent of the tree structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Approved marker term.
    pub name: String,
    /// Landmark position.
    pub point: Point,
}

/// Where a branch attaches in the stitched tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentLink {
    /// The branch connects to `parent` at point `index`.
    ///
    /// For a branch parent the index addresses its stitched sequence;
    /// for the trunk it addresses the raw trunk sequence.
    Attached {
        /// Parent structure name.
        parent: String,
        /// Attachment position within the parent's point sequence.
        index: usize,
    },
    /// No candidate parent point was within tolerance.
    Orphan,
}

impl ParentLink {
    /// Parent structure name, when attached.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::Attached { parent, .. } => Some(parent),
            Self::Orphan => None,
        }
    }

    /// Attachment index into the parent's sequence, when attached.
    #[must_use]
    pub const fn attachment_index(&self) -> Option<usize> {
        match self {
            Self::Attached { index, .. } => Some(*index),
            Self::Orphan => None,
        }
    }

    /// Returns `true` for a branch left disconnected.
    #[must_use]
    pub const fn is_orphan(&self) -> bool {
        matches!(self, Self::Orphan)
    }
}

/// Errors raised while preparing the stitching vocabulary or config.
///
/// Stitching itself never fails: heuristic misfires degrade to the
/// trunk fallback and distant branches become orphans.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// Configuration is invalid.
    #[error("invalid stitching configuration: {0}")]
    InvalidConfig(String),

    /// A vocabulary keyword produced an invalid pattern.
    #[error("invalid pattern for keyword {keyword:?}: {source}")]
    InvalidPattern {
        /// Keyword that was being compiled.
        keyword: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}
