//! vagus-io: Filesystem access for vagus tracing datasets.
//!
//! Discovers segment directories, parses trace, marker and morphology
//! CSV exports into `vagus-stitch` types, and reads and writes the JSON
//! side files. Everything that touches the disk lives here so the
//! stitching core stays pure.

pub mod csv;
pub mod discovery;
pub mod error;
pub mod json;
pub mod segment;

pub use discovery::{SegmentFiles, find_morphology_file, find_tracing_csv_files};
pub use error::IoError;
pub use json::{SegmentOutput, read_json, read_name_map, write_json, write_segment_output};
pub use segment::{SegmentData, load_segment};
