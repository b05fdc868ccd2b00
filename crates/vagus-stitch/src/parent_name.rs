//! Parent-name heuristics for branch traces.
//!
//! Branch names follow anatomical convention: "branch of X" and
//! "branch A of X" hang off structure X, while "branch to Y" and a bare
//! "… branch" hang off the trunk. A branch *to* another branch's target
//! ("branch to external branch of …") also leaves the trunk. The
//! suggestion is only a hint; the stitcher falls back to the trunk
//! whenever the named parent is not a known branch.

use regex::Regex;

use crate::types::{Side, StitchError};

/// `… to … branch … of`: a branch leading to another branch's target.
const TO_NESTED_BRANCH: &str = "[A-Za-z ]*to [A-Za-z ]*branch[A-Za-z ]* of";

/// `of` within two characters of "branch": "branch of X", "branch A of X".
const OF_PREFIX: &str = "^[A-Za-z ]{0,2}of";

/// Everything up to and including the last `branch … of` in a run.
const THROUGH_BRANCH_OF: &str = ".*?branch[A-Za-z ]* of";

/// Where the name of a branch says it attaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentSuggestion {
    /// The name does not point at another structure.
    Trunk,
    /// The name points at this structure (side-prefixed).
    Named(String),
}

/// Derives candidate parent names from branch names.
#[derive(Debug, Clone)]
pub struct ParentNameSuggester {
    to_nested_branch: Regex,
    of_prefix: Regex,
    through_branch_of: Regex,
}

impl ParentNameSuggester {
    /// Compile the name patterns.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidPattern`] if a pattern fails to
    /// compile.
    pub fn new() -> Result<Self, StitchError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| StitchError::InvalidPattern {
                keyword: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            to_nested_branch: compile(TO_NESTED_BRANCH)?,
            of_prefix: compile(OF_PREFIX)?,
            through_branch_of: compile(THROUGH_BRANCH_OF)?,
        })
    }

    /// Suggest where `branch_name` attaches.
    ///
    /// Only the text after the first "branch" is inspected. Named
    /// suggestions are prefixed with `"{side} "` unless they already
    /// start with the side label.
    #[must_use]
    pub fn suggest(&self, branch_name: &str, side: Side) -> ParentSuggestion {
        let Some(at) = branch_name.find("branch") else {
            return ParentSuggestion::Trunk;
        };
        let remaining = branch_name[at + "branch".len()..].trim();

        if self.to_nested_branch.is_match(remaining) || !self.of_prefix.is_match(remaining) {
            // "branch to …", "branch to … branch of …", and bare "… branch X"
            // all attach to the trunk.
            return ParentSuggestion::Trunk;
        }

        let parent = self.through_branch_of.replace_all(branch_name, "");
        ParentSuggestion::Named(with_side_prefix(parent.trim(), side))
    }

    /// Suggest a parent name, resolving the trunk fallback to `trunk_name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vagus_stitch::{ParentNameSuggester, Side};
    ///
    /// let suggester = ParentNameSuggester::new().unwrap();
    /// assert_eq!(
    ///     suggester.suggest_parent_name(
    ///         "left branch of recurrent laryngeal nerve",
    ///         Side::Left,
    ///         "left vagus nerve",
    ///     ),
    ///     "left recurrent laryngeal nerve",
    /// );
    /// ```
    #[must_use]
    pub fn suggest_parent_name(&self, branch_name: &str, side: Side, trunk_name: &str) -> String {
        match self.suggest(branch_name, side) {
            ParentSuggestion::Trunk => with_side_prefix(trunk_name, side),
            ParentSuggestion::Named(name) => name,
        }
    }
}

fn with_side_prefix(name: &str, side: Side) -> String {
    if name.starts_with(side.as_str()) {
        name.to_string()
    } else {
        format!("{side} {name}")
    }
}
