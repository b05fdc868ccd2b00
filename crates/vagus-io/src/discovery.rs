//! Dataset discovery.
//!
//! A tracing dataset is a directory with one sub-directory per segment.
//! Every `.csv` file below a segment directory, at any depth, is one
//! traced structure of that segment; the structure name is encoded in
//! the file name after the last `-`, with `_` for spaces.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use vagus_stitch::Side;
use walkdir::WalkDir;

use crate::error::IoError;

/// Structure name of the file holding landmark markers.
pub const MARKER_GROUP: &str = "vagal levels";

/// The trace files making up one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFiles {
    /// Segment directory name, e.g. `SR005-CL1`.
    pub name: String,
    /// Segment directory.
    pub dir: PathBuf,
    /// Side inferred from the first file's path below the dataset root.
    pub side: Side,
    /// CSV files, sorted by path.
    pub files: Vec<PathBuf>,
}

/// Find every segment under `root` that contains at least one CSV file.
///
/// Segments are returned sorted by name. Entries that cannot be read
/// while walking a segment are logged and skipped.
///
/// # Errors
///
/// Returns [`IoError::MissingDirectory`] if `root` is not a directory,
/// or [`IoError::Io`] if it cannot be listed.
pub fn find_tracing_csv_files(root: &Path) -> Result<Vec<SegmentFiles>, IoError> {
    if !root.is_dir() {
        return Err(IoError::MissingDirectory(root.to_path_buf()));
    }

    let mut segment_dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| IoError::io(root, e))? {
        let entry = entry.map_err(|e| IoError::io(root, e))?;
        if entry.path().is_dir() {
            segment_dirs.push(entry.path());
        }
    }
    segment_dirs.sort();

    let mut segments = Vec::new();
    for dir in segment_dirs {
        let files = csv_files_in(&dir);
        let Some(first) = files.first() else {
            log::debug!("skipping {}: no CSV files", dir.display());
            continue;
        };
        let side = side_from_path(first.strip_prefix(root).unwrap_or(first));
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        segments.push(SegmentFiles {
            name,
            dir,
            side,
            files,
        });
    }
    Ok(segments)
}

fn csv_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", dir.display());
                continue;
            }
        };
        if entry.file_type().is_file() && is_csv(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    files
}

fn is_csv(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}

/// Side encoded in a tracing path: left for cervical-left (`CL`) or
/// thoracic-left (`TL`) segments, right otherwise.
#[must_use]
pub fn side_from_path(path: &Path) -> Side {
    let text = path.to_string_lossy();
    if text.contains("CL") || text.contains("TL") {
        Side::Left
    } else {
        Side::Right
    }
}

/// Structure name encoded in a trace file name.
///
/// ```
/// use std::path::Path;
/// use vagus_io::discovery::group_name;
///
/// assert_eq!(
///     group_name(Path::new("SR005-CL1/SR005-CL1-left_vagus_nerve.csv")).as_deref(),
///     Some("left vagus nerve"),
/// );
/// ```
#[must_use]
pub fn group_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let tail = stem.rsplit('-').next().unwrap_or(stem.as_ref());
    // Only the first dot-separated part is the name.
    let tail = tail.split('.').next().unwrap_or(tail);
    Some(tail.replace('_', " "))
}

/// Find the morphology CSV for a segment's trunk.
///
/// A file matches when its name contains every word of `trunk_name` and
/// `segment_name`, and ends with `.csv`. Within one directory the first
/// match by file name is taken; a match in a directory visited later in
/// the walk replaces it.
#[must_use]
pub fn find_morphology_file(root: &Path, segment_name: &str, trunk_name: &str) -> Option<PathBuf> {
    let words: Vec<&str> = trunk_name.split_whitespace().collect();
    let mut matched_dirs: HashSet<PathBuf> = HashSet::new();
    let mut found = None;

    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", root.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file());

    for entry in entries {
        let is_match = {
            let file_name = entry.file_name().to_string_lossy();
            file_name.ends_with(".csv")
                && file_name.contains(segment_name)
                && words.iter().all(|w| file_name.contains(w))
        };
        if !is_match {
            continue;
        }
        let dir = entry.path().parent().map(Path::to_path_buf).unwrap_or_default();
        if matched_dirs.insert(dir) {
            found = Some(entry.into_path());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_markers() {
        assert_eq!(side_from_path(Path::new("data/SR005-CL1/a.csv")), Side::Left);
        assert_eq!(side_from_path(Path::new("data/SR005-TL2/a.csv")), Side::Left);
        assert_eq!(side_from_path(Path::new("data/SR005-CR1/a.csv")), Side::Right);
    }

    #[test]
    fn group_name_from_file() {
        assert_eq!(
            group_name(Path::new("x/SR005-CL1-branch_A_of_left_recurrent_laryngeal_nerve.csv"))
                .as_deref(),
            Some("branch A of left recurrent laryngeal nerve")
        );
        assert_eq!(
            group_name(Path::new("x/SR005-CL1-vagal_levels.csv")).as_deref(),
            Some(MARKER_GROUP)
        );
        assert_eq!(
            group_name(Path::new("x/left_vagus_nerve.csv")).as_deref(),
            Some("left vagus nerve")
        );
    }

    #[test]
    fn csv_extension_only() {
        assert!(is_csv(Path::new("a/b.csv")));
        assert!(!is_csv(Path::new("a/b.CSV")));
        assert!(!is_csv(Path::new("a/b.xlsx")));
    }

    #[test]
    fn missing_root() {
        assert!(matches!(
            find_tracing_csv_files(Path::new("/definitely/not/here")),
            Err(IoError::MissingDirectory(_))
        ));
    }
}
