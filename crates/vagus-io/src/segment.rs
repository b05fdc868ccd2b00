//! Loading one segment's traces and markers from disk.

use vagus_stitch::types::Marker;
use vagus_stitch::{Side, Trace};

use crate::csv::{read_marker_csv, read_trace_csv};
use crate::discovery::{MARKER_GROUP, SegmentFiles, group_name};
use crate::error::IoError;

/// Raw contents of one segment, ready for stitching.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentData {
    /// Segment name.
    pub name: String,
    /// Segment side.
    pub side: Side,
    /// Traces in file order.
    pub traces: Vec<Trace>,
    /// Approved landmark markers.
    pub markers: Vec<Marker>,
}

/// Read every file of a segment.
///
/// The marker file feeds [`SegmentData::markers`]; every other file
/// becomes a trace named after its file.
///
/// # Errors
///
/// Returns the first read or parse error encountered.
pub fn load_segment(files: &SegmentFiles) -> Result<SegmentData, IoError> {
    let mut traces = Vec::with_capacity(files.files.len());
    let mut markers: Vec<Marker> = Vec::new();

    for path in &files.files {
        let Some(name) = group_name(path) else {
            continue;
        };
        if name == MARKER_GROUP {
            for marker in read_marker_csv(path)? {
                if let Some(existing) = markers.iter_mut().find(|m| m.name == marker.name) {
                    *existing = marker;
                } else {
                    markers.push(marker);
                }
            }
        } else {
            let points = read_trace_csv(path)?;
            traces.push(Trace::new(name, files.side, points));
        }
    }

    log::debug!(
        "loaded {}: {} traces, {} markers",
        files.name,
        traces.len(),
        markers.len()
    );

    Ok(SegmentData {
        name: files.name.clone(),
        side: files.side,
        traces,
        markers,
    })
}
