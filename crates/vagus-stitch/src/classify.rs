//! Trace classification: trunk, vagal branch, or discard.
//!
//! Classification looks only at trace names. A trunk name contains one
//! of the side-qualified trunk phrases and never the word "branch"; a
//! branch name contains "branch" or "nerve". Branch candidates are then
//! screened against the non-vagal keyword list, where a branch *to* an
//! excluded structure is still part of the vagus but a branch *of* one
//! is not.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Vocabulary;
use crate::types::{Side, StitchError, Trace};

/// Outcome of classifying a single trace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceClass {
    /// The principal nerve of the segment.
    Trunk,
    /// A vagal branch to be stitched.
    Branch,
    /// A branch-like structure that is not part of the vagus.
    NonVagal,
    /// Neither trunk nor branch (e.g. a vessel or landmark trace).
    Unrelated,
}

/// Compiled rules for one non-vagal keyword.
#[derive(Debug, Clone)]
struct NonVagalRule {
    keyword: String,
    /// `branch … of {keyword}`: a branch of the excluded structure.
    branch_of: Regex,
    /// `branch (of X )?to {keyword}`: a vagal branch heading there.
    branch_to: Regex,
}

/// A segment's traces sorted into trunk, branches and discards.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// The trunk, when one was found. Last candidate wins.
    pub trunk: Option<Trace>,
    /// Trunk candidates that a later candidate replaced.
    pub superseded_trunks: Vec<String>,
    /// Retained vagal branches in discovery order, unique by name.
    pub branches: Vec<Trace>,
    /// Names of branch candidates excluded as non-vagal.
    pub non_vagal: Vec<String>,
    /// Names of traces matching neither test.
    pub unrelated: Vec<String>,
}

/// Name-based trace classifier built from a [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct Classifier {
    trunk_phrases: Vec<String>,
    branch_keywords: Vec<String>,
    non_vagal: Vec<NonVagalRule>,
}

impl Classifier {
    /// Compile the vocabulary's keyword lists.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidPattern`] if a non-vagal keyword
    /// cannot be embedded in a pattern (only possible for pathological
    /// sizes, since keywords are escaped).
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, StitchError> {
        let non_vagal = vocabulary
            .non_vagal_keywords
            .iter()
            .map(|keyword| -> Result<NonVagalRule, StitchError> {
                let lower = keyword.to_lowercase();
                let escaped = regex::escape(&lower);
                let compile = |pattern: String| {
                    Regex::new(&pattern).map_err(|source| StitchError::InvalidPattern {
                        keyword: keyword.clone(),
                        source,
                    })
                };
                Ok(NonVagalRule {
                    keyword: lower.clone(),
                    branch_of: compile(format!("branch[A-Za-z ]* of {escaped}"))?,
                    branch_to: compile(format!("branch (of [^ ]+ )?to {escaped}"))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trunk_phrases: lowercase_all(&vocabulary.trunk_phrases),
            branch_keywords: lowercase_all(&vocabulary.branch_keywords),
            non_vagal,
        })
    }

    /// Returns `true` if `name` identifies a trunk.
    #[must_use]
    pub fn is_trunk(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        !lower.contains("branch")
            && self
                .trunk_phrases
                .iter()
                .any(|phrase| lower.contains(phrase.as_str()))
    }

    /// Returns `true` if `name` looks like a branch (trunk check aside).
    #[must_use]
    pub fn is_branch_candidate(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.branch_keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }

    /// Returns `true` if the branch `name` is a non-vagal structure.
    ///
    /// The first `"{side} "` in the name is removed before matching so
    /// "branch of left hypoglossal nerve" compares against the bare
    /// keyword. Keywords are tried in order; the first that decides
    /// wins, and a name no keyword decides is kept as vagal.
    ///
    /// # Examples
    ///
    /// ```
    /// use vagus_stitch::{Classifier, Side, Vocabulary};
    ///
    /// let classifier = Classifier::new(&Vocabulary::default()).unwrap();
    /// assert!(classifier.branch_is_non_vagal("left hypoglossal nerve", Side::Left));
    /// assert!(!classifier.branch_is_non_vagal("branch to left hypoglossal nerve", Side::Left));
    /// ```
    #[must_use]
    pub fn branch_is_non_vagal(&self, name: &str, side: Side) -> bool {
        let lower = name.to_lowercase();
        let stripped = lower.replacen(&format!("{side} "), "", 1);

        for rule in &self.non_vagal {
            if stripped == rule.keyword {
                return true;
            }
            if rule.branch_of.is_match(&stripped) {
                return true;
            }
            if rule.branch_to.is_match(&stripped) {
                return false;
            }
        }
        false
    }

    /// Classify a single trace name in isolation.
    #[must_use]
    pub fn classify_name(&self, name: &str, side: Side) -> TraceClass {
        if self.is_trunk(name) {
            TraceClass::Trunk
        } else if !self.is_branch_candidate(name) {
            TraceClass::Unrelated
        } else if self.branch_is_non_vagal(name, side) {
            TraceClass::NonVagal
        } else {
            TraceClass::Branch
        }
    }

    /// Sort a segment's traces into trunk, branches and discards.
    ///
    /// Traces are visited in order. When several traces pass the trunk
    /// test the last one is kept and the earlier ones are reported in
    /// [`Classification::superseded_trunks`]. A repeated branch name
    /// replaces the earlier trace's points but keeps its position.
    #[must_use]
    pub fn classify(&self, traces: Vec<Trace>) -> Classification {
        let mut out = Classification::default();

        for trace in traces {
            match self.classify_name(&trace.name, trace.side) {
                TraceClass::Trunk => {
                    if let Some(previous) = out.trunk.replace(trace) {
                        log::warn!(
                            "multiple trunk candidates: {:?} superseded by a later trace",
                            previous.name
                        );
                        out.superseded_trunks.push(previous.name);
                    }
                }
                TraceClass::Branch => {
                    if let Some(existing) =
                        out.branches.iter_mut().find(|b| b.name == trace.name)
                    {
                        log::warn!("duplicate branch trace {:?}, keeping the later one", trace.name);
                        *existing = trace;
                    } else {
                        out.branches.push(trace);
                    }
                }
                TraceClass::NonVagal => {
                    log::info!("ignored non-vagal branch: {}", trace.name);
                    out.non_vagal.push(trace.name);
                }
                TraceClass::Unrelated => {
                    log::debug!("ignored unrelated trace: {}", trace.name);
                    out.unrelated.push(trace.name);
                }
            }
        }

        out
    }
}

fn lowercase_all(list: &[String]) -> Vec<String> {
    list.iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn classifier() -> Classifier {
        Classifier::new(&Vocabulary::default()).unwrap()
    }

    fn trace(name: &str) -> Trace {
        Trace::new(name, Side::Left, vec![Point::new(0.0, 0.0, 0.0)])
    }

    // --- non-vagal screening ---

    #[test]
    fn exact_keyword_is_non_vagal() {
        assert!(classifier().branch_is_non_vagal("left hypoglossal nerve", Side::Left));
    }

    #[test]
    fn branch_of_keyword_is_non_vagal() {
        let c = classifier();
        assert!(c.branch_is_non_vagal("branch of left hypoglossal nerve", Side::Left));
        assert!(c.branch_is_non_vagal("branch A of left hypoglossal nerve", Side::Left));
    }

    #[test]
    fn branch_to_keyword_is_vagal() {
        let c = classifier();
        assert!(!c.branch_is_non_vagal("branch to left hypoglossal nerve", Side::Left));
        assert!(!c.branch_is_non_vagal(
            "branch of superior nerve to left hypoglossal nerve",
            Side::Left
        ));
    }

    #[test]
    fn branch_routed_through_structure_is_vagal() {
        // "branch of X to <keyword>" with a single-word intermediate.
        assert!(!classifier().branch_is_non_vagal(
            "branch of ganglion to left carotid sinus nerve",
            Side::Left
        ));
    }

    #[test]
    fn ordinary_branch_is_vagal() {
        assert!(!classifier().branch_is_non_vagal("right pulmonary branch A", Side::Right));
    }

    #[test]
    fn side_mismatch_leaves_prefix() {
        // Only the segment's own side is stripped.
        assert!(!classifier().branch_is_non_vagal("right hypoglossal nerve", Side::Left));
    }

    #[test]
    fn matching_ignores_case() {
        assert!(classifier().branch_is_non_vagal("Left Hypoglossal Nerve", Side::Left));
    }

    #[test]
    fn capitalized_keyword_still_matches() {
        let vocabulary = Vocabulary {
            non_vagal_keywords: vec!["Hypoglossal Nerve".to_string()],
            ..Vocabulary::default()
        };
        let c = Classifier::new(&vocabulary).unwrap();
        assert!(c.branch_is_non_vagal("left hypoglossal nerve", Side::Left));
        assert!(c.branch_is_non_vagal("branch of left hypoglossal nerve", Side::Left));
        assert!(!c.branch_is_non_vagal("branch to left hypoglossal nerve", Side::Left));
    }

    // --- trunk / branch tests ---

    #[test]
    fn trunk_phrases_recognized() {
        let c = classifier();
        assert!(c.is_trunk("left vagus nerve"));
        assert!(c.is_trunk("Right Cervical Trunk"));
        assert!(c.is_trunk("left thoracic vagus nerve"));
        assert!(!c.is_trunk("branch of left vagus nerve"));
        assert!(!c.is_trunk("left recurrent laryngeal nerve"));
    }

    #[test]
    fn classify_name_covers_every_class() {
        let c = classifier();
        assert_eq!(c.classify_name("left vagus nerve", Side::Left), TraceClass::Trunk);
        assert_eq!(
            c.classify_name("left pulmonary branch A", Side::Left),
            TraceClass::Branch
        );
        assert_eq!(
            c.classify_name("left spinal accessory nerve", Side::Left),
            TraceClass::NonVagal
        );
        assert_eq!(
            c.classify_name("left common carotid artery", Side::Left),
            TraceClass::Unrelated
        );
    }

    #[test]
    fn classify_partitions_traces() {
        let out = classifier().classify(vec![
            trace("left vagus nerve"),
            trace("left pulmonary branch A"),
            trace("left hypoglossal nerve"),
            trace("left common carotid artery"),
            trace("left branch to cervical ganglion"),
        ]);
        assert_eq!(out.trunk.map(|t| t.name).as_deref(), Some("left vagus nerve"));
        let names: Vec<&str> = out.branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            ["left pulmonary branch A", "left branch to cervical ganglion"]
        );
        assert_eq!(out.non_vagal, ["left hypoglossal nerve"]);
        assert_eq!(out.unrelated, ["left common carotid artery"]);
        assert!(out.superseded_trunks.is_empty());
    }

    #[test]
    fn last_trunk_candidate_wins() {
        let out = classifier().classify(vec![
            trace("left cervical trunk"),
            trace("left pulmonary branch A"),
            trace("left vagus nerve"),
        ]);
        assert_eq!(out.trunk.map(|t| t.name).as_deref(), Some("left vagus nerve"));
        assert_eq!(out.superseded_trunks, ["left cervical trunk"]);
        // A superseded trunk never turns into a branch.
        assert_eq!(out.branches.len(), 1);
    }

    #[test]
    fn duplicate_branch_replaced_in_place() {
        let mut second = trace("left pulmonary branch A");
        second.points = vec![Point::new(9.0, 9.0, 9.0)].into();
        let out = classifier().classify(vec![
            trace("left pulmonary branch A"),
            trace("left pulmonary branch B"),
            second,
        ]);
        assert_eq!(out.branches.len(), 2);
        assert_eq!(out.branches[0].name, "left pulmonary branch A");
        assert_eq!(
            out.branches[0].points.first(),
            Some(&Point::new(9.0, 9.0, 9.0))
        );
    }

    #[test]
    fn no_trunk_is_not_an_error() {
        let out = classifier().classify(vec![trace("left pulmonary branch A")]);
        assert!(out.trunk.is_none());
        assert_eq!(out.branches.len(), 1);
    }
}
