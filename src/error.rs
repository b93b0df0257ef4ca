//! Error types for flow-log classification.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading tables, classifying the flow log, or
/// writing reports.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// An input file does not exist.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// A file could not be opened, created, read or written.
    #[error("I/O error on {}: {}", .path.display(), .source)]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read/write failure on a caller-supplied stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A CSV table is missing a header, a required column, or has an
    /// undecodable row.
    #[error("Malformed {table} table: {reason}")]
    MalformedInput { table: &'static str, reason: String },

    /// A flow-log line has too few whitespace-separated fields.
    #[error("Malformed flow-log record at line {line}: expected at least 8 fields, found {found}")]
    MalformedRecord { line: u64, found: usize },
}

impl ClassifyError {
    /// Wrap an error from opening or creating `path`.
    pub fn from_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ClassifyError::FileNotFound { path }
        } else {
            ClassifyError::FileIo { path, source }
        }
    }

    /// Attach a file path to a bare stream I/O error.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            ClassifyError::Io(source) => ClassifyError::FileIo {
                path: path.into(),
                source,
            },
            other => other,
        }
    }
}

/// Result type alias for classification operations.
pub type Result<T> = std::result::Result<T, ClassifyError>;
