//! Error types for dumpsearch.
//!
//! Every fallible library operation returns [`SearchError`]. Per-file problems
//! during a build are collected into the build summary instead of being raised,
//! see [`crate::index::build`].

use crate::utils::DecodeFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("No store at {}; run `dumpsearch build <root>` first", .0.display())]
    StoreNotFound(PathBuf),

    #[error("Store at {} is corrupt: {reason}", path.display())]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Cannot decode {} as text: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeFailure,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Wrap an I/O error, mapping the kinds callers branch on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => SearchError::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => SearchError::PermissionDenied(path),
            _ => SearchError::Io { path, source },
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SearchError::InvalidQuery(_) => 2,
            SearchError::StoreNotFound(_) => 3,
            SearchError::StoreCorrupt { .. } => 4,
            _ => 1,
        }
    }

    /// Whether a SQLite error means the file is damaged rather than busy or misused.
    pub fn is_corruption(err: &rusqlite::Error) -> bool {
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseCorrupt) | Some(rusqlite::ErrorCode::NotADatabase)
        )
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(err: rusqlite::Error) -> Self {
        SearchError::Database(err)
    }
}
