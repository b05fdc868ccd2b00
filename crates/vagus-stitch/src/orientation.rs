//! Orientation labels for stitched branches.
//!
//! Branching-pattern descriptions record each branch's direction relative
//! to the trunk with an anatomical keyword ("anteromedial", …). Medial and
//! lateral mean opposite body directions on the two sides, so the keyword
//! is relabeled per side before branches are bucketed.

use std::collections::{BTreeMap, HashMap};

use crate::config::Vocabulary;
use crate::stitch::StitchedSegment;
use crate::types::{Point, Side};

/// Keyword and side to canonical orientation label.
#[derive(Debug, Clone, Default)]
pub struct OrientationTable {
    labels: HashMap<String, (String, String)>,
}

impl OrientationTable {
    /// Build the table from the vocabulary's orientation rules.
    ///
    /// Keywords are matched case-insensitively.
    #[must_use]
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        let labels = vocabulary
            .orientation_table
            .iter()
            .map(|rule| {
                (
                    rule.keyword.trim().to_lowercase(),
                    (rule.left.clone(), rule.right.clone()),
                )
            })
            .collect();
        Self { labels }
    }

    /// Canonical label for `keyword` on `side`, if the keyword is known.
    #[must_use]
    pub fn relabel(&self, side: Side, keyword: &str) -> Option<&str> {
        let (left, right) = self.labels.get(&keyword.trim().to_lowercase())?;
        Some(match side {
            Side::Left => left,
            Side::Right => right,
        })
    }
}

/// Bucket each oriented branch's first stored point by label.
///
/// `orientations` maps branch names to raw keywords. The side used for
/// relabeling comes from the branch name. Branches with an unknown or
/// blank keyword, or no stitched geometry, contribute nothing. Buckets
/// are filled in branch-name order.
#[must_use]
pub fn assign_orientations(
    table: &OrientationTable,
    segment: &StitchedSegment,
    orientations: &BTreeMap<String, String>,
) -> BTreeMap<String, Vec<Point>> {
    let mut buckets: BTreeMap<String, Vec<Point>> = BTreeMap::new();

    for (name, keyword) in orientations {
        let Some(branch) = segment.branch(name) else {
            continue;
        };
        let side = Side::from_structure_name(name);
        let Some(label) = table.relabel(side, keyword) else {
            if !keyword.trim().is_empty() {
                log::debug!("unknown orientation {keyword:?} for {name}");
            }
            continue;
        };
        if let Some(&first) = branch.points.first() {
            buckets.entry(label.to_string()).or_default().push(first);
        }
    }

    buckets
}
