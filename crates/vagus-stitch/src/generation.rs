//! Generation ordering: stitch parents before their children.
//!
//! A child branch is matched against its parent's *stitched* geometry,
//! so the parent must be processed first. [`GenerationStrategy`] selects
//! how that order is derived and [`GenerationSorter`] applies it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::types::StitchError;

/// Names matching this denote a branch of another structure.
const NESTED_BRANCH: &str = "branch[A-Za-z ]* of";

/// Selects how branch stitching order is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// First-level branches, then every "branch … of …" branch, each
    /// tier in discovery order.
    ///
    /// Coarse but sufficient in practice: a child whose suggested parent
    /// is not stitched yet still matches against the parent's raw
    /// points, and anything unresolved falls back to the trunk.
    #[default]
    TwoTier,

    /// Topological order over suggested-parent edges.
    ///
    /// Every branch comes after the known branch its name points at.
    /// Ties resolve by discovery order; branches caught in a naming
    /// cycle are appended in discovery order.
    DependencyGraph,
}

/// Orders a segment's branches for stitching.
#[derive(Debug, Clone)]
pub struct GenerationSorter {
    strategy: GenerationStrategy,
    nested: Regex,
}

impl GenerationSorter {
    /// Create a sorter for `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidPattern`] if the nested-branch
    /// pattern fails to compile.
    pub fn new(strategy: GenerationStrategy) -> Result<Self, StitchError> {
        let nested = RegexBuilder::new(NESTED_BRANCH)
            .case_insensitive(true)
            .build()
            .map_err(|source| StitchError::InvalidPattern {
                keyword: NESTED_BRANCH.to_string(),
                source,
            })?;
        Ok(Self { strategy, nested })
    }

    /// Returns `true` if `name` denotes a second-level (or deeper) branch.
    #[must_use]
    pub fn is_nested(&self, name: &str) -> bool {
        self.nested.is_match(name)
    }

    /// Stitching order as indices into `names`.
    ///
    /// `suggested_parents[i]` is the index of the known branch that
    /// `names[i]` names as its parent, if any. Only the dependency-graph
    /// strategy consults it.
    #[must_use]
    pub fn order(&self, names: &[&str], suggested_parents: &[Option<usize>]) -> Vec<usize> {
        match self.strategy {
            GenerationStrategy::TwoTier => self.two_tier(names),
            GenerationStrategy::DependencyGraph => dependency_order(names.len(), suggested_parents),
        }
    }

    fn two_tier(&self, names: &[&str]) -> Vec<usize> {
        let (nested, first): (Vec<usize>, Vec<usize>) =
            (0..names.len()).partition(|&i| self.is_nested(names[i]));
        first.into_iter().chain(nested).collect()
    }
}

/// Kahn's algorithm with a min-heap on discovery index.
fn dependency_order(count: usize, suggested_parents: &[Option<usize>]) -> Vec<usize> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(count, count);
    let nodes: Vec<NodeIndex> = (0..count).map(|i| graph.add_node(i)).collect();

    for (child, parent) in suggested_parents.iter().enumerate().take(count) {
        if let Some(parent) = *parent
            && parent != child
            && parent < count
        {
            graph.add_edge(nodes[parent], nodes[child], ());
        }
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(count);
    let mut placed = vec![false; count];

    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        placed[i] = true;
        for child in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
            let c = graph[child];
            in_degree[c] -= 1;
            if in_degree[c] == 0 {
                ready.push(Reverse(c));
            }
        }
    }

    if order.len() < count {
        log::warn!(
            "{} branches form a parent-name cycle, appending in discovery order",
            count - order.len()
        );
        order.extend((0..count).filter(|&i| !placed[i]));
    }

    order
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sorter(strategy: GenerationStrategy) -> GenerationSorter {
        GenerationSorter::new(strategy).unwrap()
    }

    #[test]
    fn default_is_two_tier() {
        assert_eq!(GenerationStrategy::default(), GenerationStrategy::TwoTier);
    }

    #[test]
    fn nested_detection() {
        let s = sorter(GenerationStrategy::TwoTier);
        assert!(s.is_nested("branch A of left recurrent laryngeal nerve"));
        assert!(s.is_nested("left branch of recurrent laryngeal nerve"));
        assert!(s.is_nested("Branch Of left pulmonary branch H"));
        assert!(!s.is_nested("left branch to cervical ganglion"));
        assert!(!s.is_nested("left recurrent laryngeal nerve"));
    }

    #[test]
    fn two_tier_puts_first_level_first_and_is_stable() {
        let names = [
            "branch A of left branch to cervical ganglion",
            "left pulmonary branch A",
            "branch of left pulmonary branch A",
            "left branch to cervical ganglion",
            "left recurrent laryngeal nerve",
        ];
        let order = sorter(GenerationStrategy::TwoTier).order(&names, &[None; 5]);
        assert_eq!(order, vec![1, 3, 4, 0, 2]);
    }

    #[test]
    fn two_tier_empty() {
        assert!(sorter(GenerationStrategy::TwoTier).order(&[], &[]).is_empty());
    }

    #[test]
    fn dependency_graph_orders_chains() {
        // 0 <- 2 <- 1 : "1" is a branch of "2", which is a branch of "0".
        let names = ["a", "c", "b"];
        let parents = [None, Some(2), Some(0)];
        let order = sorter(GenerationStrategy::DependencyGraph).order(&names, &parents);
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn dependency_graph_is_stable_for_independent_branches() {
        let names = ["a", "b", "c"];
        let order = sorter(GenerationStrategy::DependencyGraph).order(&names, &[None; 3]);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn dependency_graph_ignores_self_reference() {
        let order =
            sorter(GenerationStrategy::DependencyGraph).order(&["a", "b"], &[Some(0), None]);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn dependency_graph_appends_cycles() {
        let names = ["a", "b", "c"];
        let parents = [Some(1), Some(0), None];
        let order = sorter(GenerationStrategy::DependencyGraph).order(&names, &parents);
        assert_eq!(order, vec![2, 0, 1]);
    }
}
