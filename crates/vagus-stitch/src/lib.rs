//! vagus-stitch: Vagus nerve trace stitching (sans-IO).
//!
//! Reconstructs a connected nerve tree from independently traced
//! polylines through:
//! classification -> parent-name suggestion -> generation ordering ->
//! nearest-point attachment -> orientation bucketing.
//!
//! Ancillary steps turn a stitched segment into a graph topology and a
//! 1D line mesh, resolve landmark markers and annotation terms, and
//! assign trunk radii from morphology samples.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! traces and returns structured data. All filesystem interaction lives
//! in `vagus-io`.

pub mod annotations;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod generation;
pub mod markers;
pub mod matcher;
pub mod morphology;
pub mod orientation;
pub mod parent_name;
pub mod stitch;
pub mod topology;
pub mod types;

pub use classify::{Classification, Classifier, TraceClass};
pub use config::{OrientationRule, StitchConfig, Vocabulary};
pub use diagnostics::{OrphanReason, OrphanReport, StitchDiagnostics};
pub use generation::{GenerationSorter, GenerationStrategy};
pub use matcher::{Attachment, BranchEnd, PointIndex, find_attachment};
pub use orientation::{OrientationTable, assign_orientations};
pub use parent_name::{ParentNameSuggester, ParentSuggestion};
pub use stitch::{StitchedBranch, StitchedSegment, Stitcher};
pub use topology::{LineMesh, MeshOptions, TreeTopology, build_line_mesh};
pub use types::{Marker, ParentLink, Point, Polyline, Side, StitchError, Trace};

/// Stitch one segment's traces.
///
/// Builds a [`Stitcher`] for `config` and runs it once. When several
/// segments share a configuration, build the [`Stitcher`] once and call
/// [`Stitcher::stitch`] per segment instead.
///
/// # Steps
///
/// 1. Classify traces into trunk, branches and discards
/// 2. Suggest each branch's parent from its name
/// 3. Order branches so parents precede children
/// 4. Attach each branch to its parent's nearest point
///
/// # Errors
///
/// Returns [`StitchError::InvalidConfig`] if `config` fails validation.
/// Returns [`StitchError::InvalidPattern`] if a vocabulary keyword
/// cannot be compiled.
///
/// # Examples
///
/// ```
/// use vagus_stitch::{Point, Side, StitchConfig, Trace, process_segment};
///
/// let trunk: Vec<Point> = (0..10).map(|i| Point::new(0.0, 0.0, f64::from(i) * 50.0)).collect();
/// let branch = vec![
///     Point::new(0.0, 0.0, 200.0),
///     Point::new(5.0, 0.0, 200.0),
///     Point::new(80.0, 0.0, 210.0),
/// ];
/// let segment = process_segment(
///     Side::Left,
///     vec![
///         Trace::new("left vagus nerve", Side::Left, trunk),
///         Trace::new("left pulmonary branch A", Side::Left, branch),
///     ],
///     &StitchConfig::default(),
/// )
/// .unwrap();
///
/// let stitched = segment.branch("left pulmonary branch A").unwrap();
/// assert_eq!(stitched.link.parent(), Some("left vagus nerve"));
/// assert_eq!(stitched.link.attachment_index(), Some(4));
/// assert_eq!(stitched.points.len(), 2);
/// ```
pub fn process_segment(
    side: Side,
    traces: Vec<Trace>,
    config: &StitchConfig,
) -> Result<StitchedSegment, StitchError> {
    Ok(Stitcher::new(config)?.stitch(side, traces))
}
