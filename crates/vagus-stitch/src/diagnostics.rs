//! Per-segment stitching diagnostics.
//!
//! Collected while a segment is stitched and carried on the result so
//! callers can print a report or serialize the counts next to the
//! stitched geometry.

use serde::{Deserialize, Serialize};

use crate::types::Side;

/// Why a branch was left disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// The branch has fewer than two points.
    TooShort,
    /// Neither a known parent branch nor a trunk was available.
    NoParentGeometry,
    /// The closest candidate end was not within tolerance.
    BeyondTolerance,
}

/// One orphaned branch and what it was compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Branch name.
    pub name: String,
    /// Parent the branch was compared against, if any.
    pub candidate_parent: Option<String>,
    /// Smallest squared distance found, if a comparison happened.
    pub min_distance_squared: Option<f64>,
    /// Why the branch was not attached.
    pub reason: OrphanReason,
}

/// Counts and name lists describing one stitched segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchDiagnostics {
    /// Side of the segment.
    pub side: Side,
    /// Traces handed to the stitcher.
    pub trace_count: usize,
    /// Whether a trunk was found.
    pub trunk_found: bool,
    /// Trunk candidates replaced by a later candidate.
    pub superseded_trunks: Vec<String>,
    /// Retained vagal branches.
    pub branch_count: usize,
    /// Branch candidates dropped as non-vagal.
    pub non_vagal: Vec<String>,
    /// Traces that were neither trunk nor branch.
    pub unrelated_count: usize,
    /// Branches attached to a parent.
    pub matched_count: usize,
    /// Attached branches whose sequence was reversed.
    pub reversed_count: usize,
    /// Attached branches whose suggested parent was not a known branch
    /// and which were matched against the trunk instead.
    pub trunk_fallback_count: usize,
    /// Branches left disconnected.
    pub orphans: Vec<OrphanReport>,
    /// Line-mesh nodes, once a mesh has been built.
    pub node_count: usize,
    /// Line-mesh elements, once a mesh has been built.
    pub element_count: usize,
}

impl StitchDiagnostics {
    /// Empty diagnostics for a segment on `side`.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            trace_count: 0,
            trunk_found: false,
            superseded_trunks: Vec::new(),
            branch_count: 0,
            non_vagal: Vec::new(),
            unrelated_count: 0,
            matched_count: 0,
            reversed_count: 0,
            trunk_fallback_count: 0,
            orphans: Vec::new(),
            node_count: 0,
            element_count: 0,
        }
    }

    /// Number of orphaned branches.
    #[must_use]
    pub const fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Record line-mesh sizes.
    pub const fn record_mesh(&mut self, node_count: usize, element_count: usize) {
        self.node_count = node_count;
        self.element_count = element_count;
    }

    /// Format a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Stitch Diagnostics ({})\n{}", self.side, "=".repeat(60)));
        lines.push(format!("{:<24} {:>8}", "Traces", self.trace_count));
        lines.push(format!(
            "{:<24} {:>8}",
            "Trunk",
            if self.trunk_found { "found" } else { "missing" }
        ));
        lines.push(format!(
            "{:<24} {:>8}",
            "Superseded trunks",
            self.superseded_trunks.len()
        ));
        lines.push(format!("{:<24} {:>8}", "Branches", self.branch_count));
        lines.push(format!("{:<24} {:>8}", "Non-vagal", self.non_vagal.len()));
        lines.push(format!("{:<24} {:>8}", "Unrelated", self.unrelated_count));
        lines.push("-".repeat(60));
        lines.push(format!("{:<24} {:>8}", "Matched", self.matched_count));
        lines.push(format!("{:<24} {:>8}", "  reversed", self.reversed_count));
        lines.push(format!(
            "{:<24} {:>8}",
            "  trunk fallback", self.trunk_fallback_count
        ));
        lines.push(format!("{:<24} {:>8}", "Orphaned", self.orphan_count()));

        for orphan in &self.orphans {
            let detail = match (&orphan.candidate_parent, orphan.min_distance_squared) {
                (Some(parent), Some(d2)) => format!("{parent} (min d2 {d2:.1})"),
                (Some(parent), None) => parent.clone(),
                _ => String::from("-"),
            };
            lines.push(format!(
                "  {:<40} {:?}: {detail}",
                orphan.name, orphan.reason
            ));
        }

        if self.node_count > 0 || self.element_count > 0 {
            lines.push("-".repeat(60));
            lines.push(format!("{:<24} {:>8}", "Mesh nodes", self.node_count));
            lines.push(format!("{:<24} {:>8}", "Mesh elements", self.element_count));
        }

        lines.join("\n")
    }
}
