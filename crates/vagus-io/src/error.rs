//! Errors raised while reading or writing segment data.

use std::path::PathBuf;

/// Errors from dataset discovery, parsing, and output.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// A file or directory could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A CSV row could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the row.
        message: String,
    },

    /// A JSON document could not be read or written.
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        /// File being accessed.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The tracing directory does not exist.
    #[error("tracing directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
