//! Tree topology and the 1D line mesh of a stitched segment.
//!
//! [`TreeTopology`] is a directed graph rooted at the trunk with one edge
//! per attached branch, weighted by the attachment index. [`LineMesh`]
//! flattens the tree into numbered nodes and two-node elements that a
//! mesh serializer can write without knowing anything about stitching.

use std::collections::{BTreeMap, HashMap, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationTerm;
use crate::morphology::TrunkRadius;
use crate::stitch::StitchedSegment;
use crate::types::{ParentLink, Point};

/// Parent/child structure of a stitched segment.
#[derive(Debug, Clone)]
pub struct TreeTopology {
    graph: DiGraph<String, usize>,
    root: Option<NodeIndex>,
    by_name: HashMap<String, NodeIndex>,
}

impl TreeTopology {
    /// Build the graph from a stitched segment.
    ///
    /// Links naming an unknown structure are ignored.
    #[must_use]
    pub fn from_segment(segment: &StitchedSegment) -> Self {
        let mut graph = DiGraph::new();
        let mut by_name = HashMap::new();

        let root = segment.trunk_name().map(|name| {
            let node = graph.add_node(name.to_string());
            by_name.insert(name.to_string(), node);
            node
        });
        for branch in &segment.branches {
            let node = graph.add_node(branch.name.clone());
            by_name.insert(branch.name.clone(), node);
        }

        for branch in &segment.branches {
            if let ParentLink::Attached { parent, index } = &branch.link
                && let (Some(&from), Some(&to)) = (by_name.get(parent), by_name.get(&branch.name))
            {
                graph.add_edge(from, to, *index);
            }
        }

        Self {
            graph,
            root,
            by_name,
        }
    }

    /// Number of structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the segment had no trunk and no branches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Parent of `name` and the attachment index, if attached.
    #[must_use]
    pub fn parent(&self, name: &str) -> Option<(&str, usize)> {
        let node = *self.by_name.get(name)?;
        let edge = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .next()?;
        Some((self.graph[edge.source()].as_str(), *edge.weight()))
    }

    /// Direct children of `name` in insertion (generation) order.
    #[must_use]
    pub fn children(&self, name: &str) -> Vec<&str> {
        let Some(&node) = self.by_name.get(name) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        children.sort_unstable();
        children
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// Edges from the trunk to `name`: 0 for the trunk, `None` when
    /// `name` is unknown or not connected to the trunk.
    #[must_use]
    pub fn depth(&self, name: &str) -> Option<usize> {
        let target = *self.by_name.get(name)?;
        self.depths().get(target.index()).copied().flatten()
    }

    /// Structures not connected to the trunk, in generation order.
    #[must_use]
    pub fn detached(&self) -> Vec<&str> {
        let depths = self.depths();
        self.graph
            .node_indices()
            .filter(|n| depths[n.index()].is_none())
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// Trunk first, then branches with every parent ahead of its
    /// children. Otherwise follows generation order.
    #[must_use]
    pub fn emission_order(&self) -> Vec<&str> {
        let mut emitted = vec![false; self.graph.node_count()];
        let mut out = Vec::with_capacity(self.graph.node_count());

        for node in self.graph.node_indices() {
            // Walk up to the first emitted ancestor, then emit downward.
            let mut chain = Vec::new();
            let mut cursor = Some(node);
            while let Some(n) = cursor {
                if emitted[n.index()] || chain.contains(&n) {
                    break;
                }
                chain.push(n);
                cursor = self.graph.neighbors_directed(n, Direction::Incoming).next();
            }
            for n in chain.into_iter().rev() {
                emitted[n.index()] = true;
                out.push(self.graph[n].as_str());
            }
        }
        out
    }

    fn depths(&self) -> Vec<Option<usize>> {
        let mut depths = vec![None; self.graph.node_count()];
        let Some(root) = self.root else {
            return depths;
        };
        depths[root.index()] = Some(0);
        let mut queue = VecDeque::from([root]);
        while let Some(n) = queue.pop_front() {
            let d = depths[n.index()].unwrap_or(0);
            for child in self.graph.neighbors_directed(n, Direction::Outgoing) {
                if depths[child.index()].is_none() {
                    depths[child.index()] = Some(d + 1);
                    queue.push_back(child);
                }
            }
        }
        depths
    }
}

/// A numbered mesh node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    /// Node identifier, starting at 1.
    pub id: usize,
    /// Node position.
    pub point: Point,
    /// Nerve radius at this node, when morphology is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// A two-node line element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineElement {
    /// Element identifier, starting at 1.
    pub id: usize,
    /// Start and end node identifiers.
    pub nodes: [usize; 2],
}

/// Optional extras folded into the line mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshOptions<'a> {
    /// Per-point trunk radius; branches get its halved average.
    pub trunk_radius: Option<&'a TrunkRadius>,
    /// Annotation terms; each adds a group mirroring its structure.
    pub terms: &'a [AnnotationTerm],
    /// Orientation buckets; each point becomes a standalone node.
    pub orientations: Option<&'a BTreeMap<String, Vec<Point>>>,
}

/// A stitched segment as a 1D line mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineMesh {
    /// All nodes, in identifier order.
    pub nodes: Vec<MeshNode>,
    /// All elements, in identifier order.
    pub elements: Vec<LineElement>,
    /// Structure names and annotation term ids to element identifiers.
    pub groups: BTreeMap<String, Vec<usize>>,
    /// Orientation labels to node identifiers.
    pub node_groups: BTreeMap<String, Vec<usize>>,
}

/// Flatten a stitched segment into a line mesh.
///
/// Structures are numbered in [`TreeTopology::emission_order`]. Each
/// consecutive pair of points becomes an element. An attached branch's
/// first element instead runs from its parent's attachment node to the
/// branch's first node; when the attachment index falls outside the
/// parent's points the branch is left unconnected.
#[must_use]
pub fn build_line_mesh(
    segment: &StitchedSegment,
    topology: &TreeTopology,
    options: &MeshOptions<'_>,
) -> LineMesh {
    let order = topology.emission_order();
    let trunk_name = segment.trunk_name();
    let branch_radius = options.trunk_radius.map(TrunkRadius::branch_radius);

    // Number every node first so links never depend on emission order.
    let mut starts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut next_id = 1;
    for &name in &order {
        let len = segment.points_of(name).map_or(0, <[Point]>::len);
        starts.insert(name, (next_id, len));
        next_id += len;
    }

    let mut mesh = LineMesh::default();
    let mut element_id = 1;

    for &name in &order {
        let Some(points) = segment.points_of(name) else {
            continue;
        };
        let Some(&(start, _)) = starts.get(name) else {
            continue;
        };
        let is_trunk = trunk_name == Some(name);
        let link = if is_trunk {
            None
        } else {
            segment.branch(name).map(|b| &b.link)
        };

        let parent_node = match link {
            Some(ParentLink::Attached { parent, index }) => {
                starts.get(parent.as_str()).and_then(|&(parent_start, len)| {
                    if *index < len {
                        Some(parent_start + index)
                    } else {
                        log::warn!(
                            "{name}: attachment index {index} outside {parent} ({len} points)"
                        );
                        None
                    }
                })
            }
            _ => None,
        };

        let group = mesh.groups.entry(name.to_string()).or_default();
        for (k, &point) in points.iter().enumerate() {
            let id = start + k;
            let radius = if is_trunk {
                options
                    .trunk_radius
                    .and_then(|r| r.per_point.get(k).copied())
            } else {
                branch_radius
            };
            mesh.nodes.push(MeshNode { id, point, radius });

            let ends = match (k, parent_node) {
                (0, Some(parent)) => Some([parent, id]),
                (0, None) => None,
                _ => Some([id - 1, id]),
            };
            if let Some(nodes) = ends {
                mesh.elements.push(LineElement {
                    id: element_id,
                    nodes,
                });
                group.push(element_id);
                element_id += 1;
            }
        }
    }

    for term in options.terms {
        if let Some(elements) = mesh.groups.get(&term.name).cloned() {
            let group = mesh.groups.entry(term.id.clone()).or_default();
            group.extend(elements);
            group.sort_unstable();
            group.dedup();
        }
    }

    if let Some(orientations) = options.orientations {
        for (label, points) in orientations {
            let group = mesh.node_groups.entry(label.clone()).or_default();
            for &point in points {
                mesh.nodes.push(MeshNode {
                    id: next_id,
                    point,
                    radius: None,
                });
                group.push(next_id);
                next_id += 1;
            }
        }
    }

    mesh
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StitchConfig;
    use crate::diagnostics::StitchDiagnostics;
    use crate::stitch::{StitchedBranch, Stitcher};
    use crate::types::{Polyline, Side, Trace};

    fn line(n: usize, x: f64) -> Polyline {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let z = i as f64;
                Point::new(x, 0.0, z)
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn branch(name: &str, points: Polyline, link: ParentLink) -> StitchedBranch {
        StitchedBranch {
            name: name.to_string(),
            points,
            link,
            reversed: false,
        }
    }

    fn attached(parent: &str, index: usize) -> ParentLink {
        ParentLink::Attached {
            parent: parent.to_string(),
            index,
        }
    }

    fn segment(branches: Vec<StitchedBranch>) -> StitchedSegment {
        StitchedSegment {
            side: Side::Left,
            trunk: Some(Trace::new("left vagus nerve", Side::Left, line(4, 0.0))),
            branches,
            diagnostics: StitchDiagnostics::new(Side::Left),
        }
    }

    #[test]
    fn depth_children_and_detached() {
        let seg = segment(vec![
            branch("A", line(3, 1.0), attached("left vagus nerve", 1)),
            branch("B", line(2, 2.0), attached("A", 2)),
            branch("C", line(2, 3.0), ParentLink::Orphan),
        ]);
        let topo = TreeTopology::from_segment(&seg);
        assert_eq!(topo.len(), 4);
        assert_eq!(topo.depth("left vagus nerve"), Some(0));
        assert_eq!(topo.depth("A"), Some(1));
        assert_eq!(topo.depth("B"), Some(2));
        assert_eq!(topo.depth("C"), None);
        assert_eq!(topo.depth("nope"), None);
        assert_eq!(topo.children("left vagus nerve"), ["A"]);
        assert_eq!(topo.parent("B"), Some(("A", 2)));
        assert_eq!(topo.parent("C"), None);
        assert_eq!(topo.detached(), ["C"]);
    }

    #[test]
    fn emission_puts_parents_first() {
        // Child listed before its parent, as two-tier ordering can do
        // for deeper nesting.
        let seg = segment(vec![
            branch("child", line(2, 2.0), attached("parent", 0)),
            branch("parent", line(2, 1.0), attached("left vagus nerve", 0)),
        ]);
        let topo = TreeTopology::from_segment(&seg);
        assert_eq!(
            topo.emission_order(),
            ["left vagus nerve", "parent", "child"]
        );
    }

    #[test]
    fn emission_survives_cycles() {
        let seg = segment(vec![
            branch("A", line(2, 1.0), attached("B", 0)),
            branch("B", line(2, 2.0), attached("A", 0)),
        ]);
        let topo = TreeTopology::from_segment(&seg);
        let order = topo.emission_order();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], "left vagus nerve");
    }

    #[test]
    fn mesh_numbering_and_links() {
        let seg = segment(vec![
            branch("A", line(3, 1.0), attached("left vagus nerve", 2)),
            branch("B", line(2, 2.0), ParentLink::Orphan),
        ]);
        let topo = TreeTopology::from_segment(&seg);
        let mesh = build_line_mesh(&seg, &topo, &MeshOptions::default());

        // Trunk 1..=4, A 5..=7, B 8..=9.
        assert_eq!(mesh.nodes.len(), 9);
        let ids: Vec<usize> = mesh.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, (1..=9).collect::<Vec<_>>());

        let pairs: Vec<[usize; 2]> = mesh.elements.iter().map(|e| e.nodes).collect();
        assert_eq!(
            pairs,
            vec![
                [1, 2],
                [2, 3],
                [3, 4],
                [3, 5],
                [5, 6],
                [6, 7],
                [8, 9],
            ]
        );
        assert_eq!(mesh.groups["left vagus nerve"], vec![1, 2, 3]);
        assert_eq!(mesh.groups["A"], vec![4, 5, 6]);
        assert_eq!(mesh.groups["B"], vec![7]);
    }

    #[test]
    fn out_of_range_attachment_is_unlinked() {
        let seg = segment(vec![branch(
            "A",
            line(2, 1.0),
            attached("left vagus nerve", 99),
        )]);
        let topo = TreeTopology::from_segment(&seg);
        let mesh = build_line_mesh(&seg, &topo, &MeshOptions::default());
        assert_eq!(mesh.groups["A"].len(), 1);
        assert_eq!(mesh.elements.last().unwrap().nodes, [5, 6]);
    }

    #[test]
    fn radius_terms_and_orientations() {
        let seg = segment(vec![branch(
            "A",
            line(2, 1.0),
            attached("left vagus nerve", 0),
        )]);
        let topo = TreeTopology::from_segment(&seg);
        let radius = TrunkRadius {
            per_point: vec![4.0, 4.0, 8.0, 8.0],
            average: 6.0,
        };
        let terms = [AnnotationTerm {
            name: "left vagus nerve".to_string(),
            id: "ILX:0785628".to_string(),
        }];
        let orientations = BTreeMap::from([(
            "orientation left".to_string(),
            vec![Point::new(9.0, 9.0, 9.0)],
        )]);
        let mesh = build_line_mesh(
            &seg,
            &topo,
            &MeshOptions {
                trunk_radius: Some(&radius),
                terms: &terms,
                orientations: Some(&orientations),
            },
        );

        assert_eq!(mesh.nodes[2].radius, Some(8.0));
        assert_eq!(mesh.nodes[4].radius, Some(3.0));
        assert_eq!(mesh.groups["ILX:0785628"], mesh.groups["left vagus nerve"]);
        assert_eq!(mesh.node_groups["orientation left"], vec![7]);
        assert_eq!(mesh.nodes.last().unwrap().radius, None);
    }

    #[test]
    fn stitched_segment_round_trip_through_mesh() {
        let trunk: Vec<Point> = (0..5)
            .map(|i| Point::new(0.0, 0.0, f64::from(i) * 10.0))
            .collect();
        let traces = vec![
            Trace::new("left vagus nerve", Side::Left, trunk),
            Trace::new(
                "left pulmonary branch A",
                Side::Left,
                vec![
                    Point::new(0.0, 0.0, 20.0),
                    Point::new(1.0, 0.0, 20.0),
                    Point::new(30.0, 0.0, 20.0),
                ],
            ),
        ];
        let seg = Stitcher::new(&StitchConfig::default())
            .unwrap()
            .stitch(Side::Left, traces);
        let topo = TreeTopology::from_segment(&seg);
        let mesh = build_line_mesh(&seg, &topo, &MeshOptions::default());
        // 5 trunk nodes + 2 stitched branch nodes; 4 + 2 elements.
        assert_eq!(mesh.nodes.len(), 7);
        assert_eq!(mesh.elements.len(), 6);
        assert_eq!(mesh.elements[4].nodes, [3, 6]);
    }
}
