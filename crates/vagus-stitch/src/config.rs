//! Stitching configuration and the anatomical vocabulary it carries.
//!
//! Keyword lists and the orientation relabeling table are plain data so
//! they can be versioned, serialized alongside results, and swapped in
//! tests without touching the classification logic.

use serde::{Deserialize, Serialize};

use crate::generation::GenerationStrategy;
use crate::types::StitchError;

/// Trunk phrases recognized when classifying traces.
const TRUNK_PHRASES: &[&str] = &[
    "left cervical trunk",
    "right cervical trunk",
    "left thoracic trunk",
    "right thoracic trunk",
    "left vagus nerve",
    "right vagus nerve",
    "left cervical vagus nerve",
    "right cervical vagus nerve",
    "left thoracic vagus nerve",
    "right thoracic vagus nerve",
];

/// Substrings that mark a trace as a candidate branch.
const BRANCH_KEYWORDS: &[&str] = &["branch", "nerve"];

/// Structures traced alongside the vagus that are not part of it.
///
/// Order matters: the first keyword that yields a decision wins.
const NON_VAGAL_KEYWORDS: &[&str] = &[
    "carotid sinus nerve",
    "glossopharyngeal nerve",
    "hypoglossal nerve",
    "spinal accessory nerve",
    "superior root of ansa cervicalis",
    "cervical sympathetic trunk",
];

/// `(keyword, left-side label, right-side label)`.
const ORIENTATION_TABLE: &[(&str, &str, &str)] = &[
    ("anterior", "orientation anterior", "orientation anterior"),
    ("posterior", "orientation posterior", "orientation posterior"),
    ("medial", "orientation right", "orientation left"),
    ("lateral", "orientation left", "orientation right"),
    (
        "anteromedial",
        "orientation right anterior",
        "orientation left anterior",
    ),
    (
        "anterolateral",
        "orientation left anterior",
        "orientation right anterior",
    ),
    (
        "posteromedial",
        "orientation right posterior",
        "orientation left posterior",
    ),
    (
        "posterolateral",
        "orientation left posterior",
        "orientation right posterior",
    ),
];

/// One row of the orientation relabeling table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationRule {
    /// Raw keyword from the branching-pattern description.
    pub keyword: String,
    /// Canonical label for a left-side branch.
    pub left: String,
    /// Canonical label for a right-side branch.
    pub right: String,
}

/// Static word lists driving classification and relabeling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Side-qualified phrases identifying the trunk.
    pub trunk_phrases: Vec<String>,
    /// Substrings identifying candidate branches.
    pub branch_keywords: Vec<String>,
    /// Non-vagal structure names, evaluated in order.
    pub non_vagal_keywords: Vec<String>,
    /// Orientation relabeling table.
    pub orientation_table: Vec<OrientationRule>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            trunk_phrases: owned(TRUNK_PHRASES),
            branch_keywords: owned(BRANCH_KEYWORDS),
            non_vagal_keywords: owned(NON_VAGAL_KEYWORDS),
            orientation_table: ORIENTATION_TABLE
                .iter()
                .map(|&(keyword, left, right)| OrientationRule {
                    keyword: keyword.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                })
                .collect(),
        }
    }
}

/// Configuration for stitching one segment.
///
/// Shared read-only across segments, so independent segments can be
/// processed on separate threads with a cloned or borrowed config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Squared-distance threshold below which a branch is considered
    /// connected to its candidate parent. Same units as the coordinates,
    /// squared.
    pub stitching_tolerance: f64,

    /// How branches are ordered so parents are stitched before children.
    pub generation_strategy: GenerationStrategy,

    /// Keyword lists and the orientation table.
    pub vocabulary: Vocabulary,
}

impl StitchConfig {
    /// Default squared stitching tolerance, tuned for micro-CT tracings
    /// in micrometre units.
    pub const DEFAULT_STITCHING_TOLERANCE: f64 = 110_000.0;

    /// Check invariants that serde and public fields cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidConfig`] if the tolerance is negative,
    /// NaN or infinite, or if the vocabulary has no trunk phrases.
    pub fn validate(&self) -> Result<(), StitchError> {
        if !self.stitching_tolerance.is_finite() || self.stitching_tolerance < 0.0 {
            return Err(StitchError::InvalidConfig(format!(
                "stitching_tolerance must be a finite non-negative squared distance, got {}",
                self.stitching_tolerance
            )));
        }
        if self.vocabulary.trunk_phrases.is_empty() {
            return Err(StitchError::InvalidConfig(
                "vocabulary.trunk_phrases must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            stitching_tolerance: Self::DEFAULT_STITCHING_TOLERANCE,
            generation_strategy: GenerationStrategy::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}
