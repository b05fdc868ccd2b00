//! Nearest-point matching between a branch and a candidate parent.
//!
//! The parent's points go into an R\*-tree. A branch is tested at two
//! candidate ends: its second point (the first is assumed to duplicate
//! the parent point it was traced from) and its last point. Ties are
//! resolved the way a linear `<=` scan over the parent would resolve
//! them: the highest parent index at the minimum distance wins, and the
//! last point wins over the second when both are equally close.

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A parent point tagged with its position in the parent sequence.
type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Spatial index over one point sequence.
#[derive(Debug, Clone)]
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Index `points`, remembering each point's position.
    #[must_use]
    pub fn new(points: &[Point]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(p.to_array(), i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest indexed point to `query` as `(index, squared distance)`.
    ///
    /// Among points at exactly the minimum distance the highest index
    /// is returned. `None` if the index is empty.
    #[must_use]
    pub fn nearest(&self, query: Point) -> Option<(usize, f64)> {
        let mut hits = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&query.to_array());
        let (first, min_d2) = hits.next()?;
        let index = hits
            .take_while(|&(_, d2)| d2 <= min_d2)
            .fold(first.data, |best, (hit, _)| best.max(hit.data));
        Some((index, min_d2))
    }
}

/// Which end of a branch connects to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchEnd {
    /// The branch's second point: it was traced outward from the parent.
    Head,
    /// The branch's last point: it was traced toward the parent.
    Tail,
}

/// Closest connection between a branch and a parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Index of the closest parent point.
    pub parent_index: usize,
    /// Squared distance between the branch end and that parent point.
    pub distance_squared: f64,
    /// Which branch end is closest.
    pub end: BranchEnd,
}

/// Find the closest connection between `branch` and `parent`.
///
/// Returns `None` when the branch has fewer than two points or the
/// parent is empty; such branches cannot be stitched.
#[must_use]
pub fn find_attachment(branch: &[Point], parent: &PointIndex) -> Option<Attachment> {
    if branch.len() < 2 {
        return None;
    }
    let head = branch[1];
    let tail = *branch.last()?;

    let (head_index, head_d2) = parent.nearest(head)?;
    let (tail_index, tail_d2) = parent.nearest(tail)?;

    let attachment = if tail_d2 <= head_d2 {
        Attachment {
            parent_index: tail_index,
            distance_squared: tail_d2,
            end: BranchEnd::Tail,
        }
    } else {
        Attachment {
            parent_index: head_index,
            distance_squared: head_d2,
            end: BranchEnd::Head,
        }
    };
    Some(attachment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line_x(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64 * 10.0;
                Point::new(x, 0.0, 0.0)
            })
            .collect()
    }

    /// Reference: linear scan with the non-strict comparison.
    fn scan(branch: &[Point], parent: &[Point]) -> (usize, f64, BranchEnd) {
        let mut best = (0, f64::INFINITY, BranchEnd::Head);
        for (end, p) in [
            (BranchEnd::Head, branch[1]),
            (BranchEnd::Tail, branch[branch.len() - 1]),
        ] {
            for (i, q) in parent.iter().enumerate() {
                let d2 = q.distance_squared(p);
                if d2 <= best.1 {
                    best = (i, d2, end);
                }
            }
        }
        best
    }

    #[test]
    fn nearest_on_empty_index() {
        let index = PointIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.nearest(Point::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn nearest_finds_closest() {
        let index = PointIndex::new(&line_x(20));
        assert_eq!(index.len(), 20);
        let (i, d2) = index.nearest(Point::new(121.0, 2.0, 0.0)).unwrap();
        assert_eq!(i, 12);
        assert!((d2 - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_tie_prefers_highest_index() {
        // Query sits exactly between points 3 and 4.
        let index = PointIndex::new(&line_x(10));
        let (i, d2) = index.nearest(Point::new(35.0, 0.0, 0.0)).unwrap();
        assert_eq!(i, 4);
        assert!((d2 - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_tie_among_duplicates() {
        let pts = vec![
            Point::new(1.0, 1.0, 1.0),
            Point::new(5.0, 5.0, 5.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(9.0, 9.0, 9.0),
        ];
        let index = PointIndex::new(&pts);
        assert_eq!(index.nearest(Point::new(1.0, 1.0, 1.0)).unwrap().0, 2);
    }

    #[test]
    fn short_branch_has_no_attachment() {
        let index = PointIndex::new(&line_x(5));
        assert!(find_attachment(&[Point::new(0.0, 0.0, 0.0)], &index).is_none());
        assert!(find_attachment(&[], &index).is_none());
    }

    #[test]
    fn empty_parent_has_no_attachment() {
        let index = PointIndex::new(&[]);
        assert!(find_attachment(&line_x(3), &index).is_none());
    }

    #[test]
    fn head_attachment() {
        let parent = line_x(20);
        let branch = vec![
            Point::new(120.0, 0.0, 0.0),
            Point::new(121.0, 3.0, 0.0),
            Point::new(125.0, 50.0, 0.0),
            Point::new(130.0, 90.0, 0.0),
        ];
        let a = find_attachment(&branch, &PointIndex::new(&parent)).unwrap();
        assert_eq!(a.end, BranchEnd::Head);
        assert_eq!(a.parent_index, 12);
        assert!((a.distance_squared - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tail_attachment() {
        let parent = line_x(20);
        let branch = vec![
            Point::new(60.0, 90.0, 0.0),
            Point::new(55.0, 60.0, 0.0),
            Point::new(51.0, 30.0, 0.0),
            Point::new(50.0, 1.0, 0.0),
        ];
        let a = find_attachment(&branch, &PointIndex::new(&parent)).unwrap();
        assert_eq!(a.end, BranchEnd::Tail);
        assert_eq!(a.parent_index, 5);
    }

    #[test]
    fn equal_ends_prefer_tail() {
        // Head and tail both sit 1 unit off the parent line.
        let parent = line_x(10);
        let branch = vec![
            Point::new(20.0, 0.0, 0.0),
            Point::new(20.0, 1.0, 0.0),
            Point::new(40.0, 30.0, 0.0),
            Point::new(70.0, 1.0, 0.0),
        ];
        let a = find_attachment(&branch, &PointIndex::new(&parent)).unwrap();
        assert_eq!(a.end, BranchEnd::Tail);
        assert_eq!(a.parent_index, 7);
    }

    #[test]
    fn agrees_with_linear_scan() {
        let parent: Vec<Point> = (0..50)
            .map(|i| {
                let t = f64::from(i);
                Point::new(t * 3.0, (t * 0.7).sin() * 20.0, t)
            })
            .collect();
        let branches = [
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(31.0, 5.0, 11.0),
                Point::new(200.0, 200.0, 200.0),
            ],
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(-500.0, 0.0, 0.0),
                Point::new(90.0, 3.0, 29.0),
            ],
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(60.0, 60.0, 60.0),
                Point::new(60.0, 60.0, 60.0),
            ],
        ];
        let index = PointIndex::new(&parent);
        for branch in &branches {
            let a = find_attachment(branch, &index).unwrap();
            let (i, d2, end) = scan(branch, &parent);
            assert_eq!(a.parent_index, i, "index mismatch for {branch:?}");
            assert_eq!(a.end, end, "end mismatch for {branch:?}");
            assert_eq!(a.distance_squared.to_bits(), d2.to_bits());
        }
    }

    #[test]
    fn point_metric_matches_index_metric() {
        use rstar::PointDistance;

        let points = [
            Point::new(0.1, 0.2, 0.3),
            Point::new(-1234.567, 89.01, 0.000_3),
            Point::new(1e8 / 3.0, -2.0 / 7.0, 5.5),
            Point::new(99.999, 100.001, -0.1),
        ];
        for a in points {
            for b in points {
                assert_eq!(
                    a.distance_squared(b).to_bits(),
                    b.to_array().distance_2(&a.to_array()).to_bits(),
                    "{a:?} {b:?}"
                );
            }
        }
    }
}
