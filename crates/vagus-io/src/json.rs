//! JSON inputs (name mappings, configuration) and per-segment output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use vagus_stitch::annotations::AnnotationTerm;
use vagus_stitch::types::{Marker, Point};
use vagus_stitch::{LineMesh, StitchedSegment};

use crate::error::IoError;

/// Read a JSON document.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, or
/// [`IoError::Json`] if it does not deserialize into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a flat `name -> value` mapping, e.g. branch orientations or
/// branch annotation terms.
///
/// # Errors
///
/// See [`read_json`].
pub fn read_name_map(path: &Path) -> Result<BTreeMap<String, String>, IoError> {
    read_json(path)
}

/// Write `value` as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`IoError::Io`] on filesystem failure or [`IoError::Json`]
/// if serialization fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::io(parent, e))?;
    }
    let mut text = serde_json::to_string_pretty(value).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    std::fs::write(path, text).map_err(|e| IoError::io(path, e))
}

/// Everything produced for one segment, as written to disk.
#[derive(Debug, Serialize)]
pub struct SegmentOutput<'a> {
    /// Segment name.
    pub name: &'a str,
    /// Stitched tree with its diagnostics.
    pub segment: &'a StitchedSegment,
    /// Approved landmark markers.
    pub markers: &'a [Marker],
    /// Annotation terms for the trunk and branches.
    pub terms: &'a [AnnotationTerm],
    /// Orientation label to first-branch-point buckets.
    pub orientations: &'a BTreeMap<String, Vec<Point>>,
    /// Line mesh of the stitched tree.
    pub mesh: &'a LineMesh,
}

/// Write `output` to `{dir}/{name}.json` and return the path.
///
/// # Errors
///
/// See [`write_json`].
pub fn write_segment_output(dir: &Path, output: &SegmentOutput<'_>) -> Result<PathBuf, IoError> {
    let path = dir.join(format!("{}.json", output.name));
    write_json(&path, output)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn name_map_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/orientations.json");
        let map = BTreeMap::from([(
            "left pulmonary branch A".to_string(),
            "anteromedial".to_string(),
        )]);
        write_json(&path, &map).unwrap();
        assert_eq!(read_name_map(&path).unwrap(), map);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_name_map(&path), Err(IoError::Json { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_name_map(&dir.path().join("absent.json")),
            Err(IoError::Io { .. })
        ));
    }
}
