//! Segment stitching: classification, ordering and attachment.
//!
//! [`Stitcher`] ties the pieces together for one segment. Traces are
//! classified, branches are ordered so that parents come first, and each
//! branch is then matched against its parent's geometry. A matched
//! branch loses its head point and is reversed when its tail was the
//! attaching end, so every stitched branch runs outward from its parent.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::config::StitchConfig;
use crate::diagnostics::{OrphanReason, OrphanReport, StitchDiagnostics};
use crate::generation::GenerationSorter;
use crate::matcher::{BranchEnd, PointIndex, find_attachment};
use crate::parent_name::{ParentNameSuggester, ParentSuggestion};
use crate::types::{ParentLink, Point, Polyline, Side, StitchError, Trace};

/// A branch after stitching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchedBranch {
    /// Branch name.
    pub name: String,
    /// Final point sequence. Raw points for an orphan.
    pub points: Polyline,
    /// Where the branch attaches.
    pub link: ParentLink,
    /// Whether the sequence was reversed while stitching.
    pub reversed: bool,
}

/// The stitched tree for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchedSegment {
    /// Side of the segment.
    pub side: Side,
    /// The trunk, if one was found. Its points are never modified.
    pub trunk: Option<Trace>,
    /// Branches in generation order.
    pub branches: Vec<StitchedBranch>,
    /// Counts collected while stitching.
    pub diagnostics: StitchDiagnostics,
}

impl StitchedSegment {
    /// Trunk name, if a trunk was found.
    #[must_use]
    pub fn trunk_name(&self) -> Option<&str> {
        self.trunk.as_ref().map(|t| t.name.as_str())
    }

    /// Look up a stitched branch by name.
    #[must_use]
    pub fn branch(&self, name: &str) -> Option<&StitchedBranch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Branch names in generation order.
    pub fn branch_names(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|b| b.name.as_str())
    }

    /// Point sequence of the trunk or of a branch, by name.
    #[must_use]
    pub fn points_of(&self, name: &str) -> Option<&[Point]> {
        if let Some(trunk) = &self.trunk
            && trunk.name == name
        {
            return Some(trunk.points.points());
        }
        self.branch(name).map(|b| b.points.points())
    }

    /// Every branch's parent link keyed by branch name.
    #[must_use]
    pub fn parent_links(&self) -> BTreeMap<&str, &ParentLink> {
        self.branches
            .iter()
            .map(|b| (b.name.as_str(), &b.link))
            .collect()
    }
}

/// Stitches segments with a fixed configuration.
///
/// Holds the compiled vocabulary so it is built once and reused for
/// every segment.
#[derive(Debug, Clone)]
pub struct Stitcher {
    config: StitchConfig,
    classifier: Classifier,
    suggester: ParentNameSuggester,
    sorter: GenerationSorter,
}

impl Stitcher {
    /// Validate `config` and compile its vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidConfig`] if validation fails, or
    /// [`StitchError::InvalidPattern`] if a keyword cannot be compiled.
    pub fn new(config: &StitchConfig) -> Result<Self, StitchError> {
        config.validate()?;
        Ok(Self {
            classifier: Classifier::new(&config.vocabulary)?,
            suggester: ParentNameSuggester::new()?,
            sorter: GenerationSorter::new(config.generation_strategy)?,
            config: config.clone(),
        })
    }

    /// The configuration this stitcher was built with.
    #[must_use]
    pub const fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Stitch one segment's traces into a tree.
    ///
    /// Never fails: a missing trunk or a distant branch yields orphans
    /// that are reported in the diagnostics.
    #[must_use]
    pub fn stitch(&self, side: Side, traces: Vec<Trace>) -> StitchedSegment {
        let mut diagnostics = StitchDiagnostics::new(side);
        diagnostics.trace_count = traces.len();

        let classification = self.classifier.classify(traces);
        let trunk = classification.trunk;
        let branches = classification.branches;

        diagnostics.trunk_found = trunk.is_some();
        diagnostics.superseded_trunks = classification.superseded_trunks;
        diagnostics.non_vagal = classification.non_vagal;
        diagnostics.unrelated_count = classification.unrelated.len();
        diagnostics.branch_count = branches.len();

        if trunk.is_none() && !branches.is_empty() {
            log::warn!(
                "{side} segment has no trunk, {} branches cannot attach to it",
                branches.len()
            );
        }

        let by_name: HashMap<&str, usize> = branches
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), i))
            .collect();

        // Suggested parent per branch, resolved to a known branch index.
        let suggested: Vec<Option<usize>> = branches
            .iter()
            .enumerate()
            .map(|(i, b)| match self.suggester.suggest(&b.name, side) {
                ParentSuggestion::Named(name) => {
                    by_name.get(name.as_str()).copied().filter(|&p| p != i)
                }
                ParentSuggestion::Trunk => None,
            })
            .collect();

        let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
        let order = self.sorter.order(&names, &suggested);

        let trunk_index = trunk
            .as_ref()
            .map(|t| (t.name.as_str(), PointIndex::new(t.points.points())));

        let mut stitched: Vec<Option<StitchedBranch>> = (0..branches.len()).map(|_| None).collect();

        for &i in &order {
            let branch = &branches[i];
            let record = if branch.points.len() < 2 {
                self.orphan(branch, None, None, OrphanReason::TooShort, &mut diagnostics)
            } else if let Some(p) = suggested[i] {
                let parent_points = stitched[p]
                    .as_ref()
                    .map_or(branches[p].points.points(), |s| s.points.points());
                let index = PointIndex::new(parent_points);
                self.attach(branch, &branches[p].name, &index, &mut diagnostics)
            } else if let Some((trunk_name, index)) = &trunk_index {
                if self.suggests_other_structure(&branch.name, side) {
                    diagnostics.trunk_fallback_count += 1;
                }
                self.attach(branch, trunk_name, index, &mut diagnostics)
            } else {
                self.orphan(
                    branch,
                    None,
                    None,
                    OrphanReason::NoParentGeometry,
                    &mut diagnostics,
                )
            };
            stitched[i] = Some(record);
        }

        let branches: Vec<StitchedBranch> = order
            .iter()
            .filter_map(|&i| stitched[i].take())
            .collect();

        log::info!(
            "{side} segment: {} branches, {} matched, {} orphaned",
            branches.len(),
            diagnostics.matched_count,
            diagnostics.orphan_count()
        );

        StitchedSegment {
            side,
            trunk,
            branches,
            diagnostics,
        }
    }

    fn suggests_other_structure(&self, name: &str, side: Side) -> bool {
        matches!(
            self.suggester.suggest(name, side),
            ParentSuggestion::Named(_)
        )
    }

    fn attach(
        &self,
        branch: &Trace,
        parent_name: &str,
        parent: &PointIndex,
        diagnostics: &mut StitchDiagnostics,
    ) -> StitchedBranch {
        let Some(attachment) = find_attachment(branch.points.points(), parent) else {
            return self.orphan(
                branch,
                Some(parent_name),
                None,
                OrphanReason::NoParentGeometry,
                diagnostics,
            );
        };

        if attachment.distance_squared >= self.config.stitching_tolerance {
            return self.orphan(
                branch,
                Some(parent_name),
                Some(attachment.distance_squared),
                OrphanReason::BeyondTolerance,
                diagnostics,
            );
        }

        let reversed = attachment.end == BranchEnd::Tail;
        log::debug!(
            "{} -> {parent_name}[{}] via {:?} (d2 {:.1})",
            branch.name,
            attachment.parent_index,
            attachment.end,
            attachment.distance_squared
        );
        if reversed {
            log::debug!("reversed {}", branch.name);
            diagnostics.reversed_count += 1;
        }
        diagnostics.matched_count += 1;

        StitchedBranch {
            name: branch.name.clone(),
            points: branch.points.stitched(reversed),
            link: ParentLink::Attached {
                parent: parent_name.to_string(),
                index: attachment.parent_index,
            },
            reversed,
        }
    }

    #[allow(clippy::unused_self)]
    fn orphan(
        &self,
        branch: &Trace,
        candidate_parent: Option<&str>,
        min_distance_squared: Option<f64>,
        reason: OrphanReason,
        diagnostics: &mut StitchDiagnostics,
    ) -> StitchedBranch {
        match (candidate_parent, min_distance_squared) {
            (Some(parent), Some(d2)) => log::warn!(
                "{} left unattached: closest point on {parent} is at squared distance {d2:.1}",
                branch.name
            ),
            _ => log::warn!("{} left unattached: {reason:?}", branch.name),
        }
        diagnostics.orphans.push(OrphanReport {
            name: branch.name.clone(),
            candidate_parent: candidate_parent.map(ToString::to_string),
            min_distance_squared,
            reason,
        });
        StitchedBranch {
            name: branch.name.clone(),
            points: branch.points.clone(),
            link: ParentLink::Orphan,
            reversed: false,
        }
    }
}
