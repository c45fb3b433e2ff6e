use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Monotonic build counter stamped on every row written by a build
pub type Generation = i64;

/// Store schema version; a store carrying any other value is rejected
pub const STORE_VERSION: u32 = 1;

/// One indexed file: relative path plus its full text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub path: String,
    pub content: String,
}

impl IndexedDocument {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Build a document from a path relative to the indexed root.
    /// Separators are normalized to `/` so stores are portable across platforms.
    pub fn from_relative(rel_path: &Path, content: String) -> Self {
        Self {
            path: normalize_rel_path(rel_path),
            content,
        }
    }
}

/// Render a relative path with `/` separators
pub fn normalize_rel_path(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Configuration for a single build
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Globs selecting content files, matched against the root-relative path
    pub include: Vec<String>,
    /// Commit after this many documents
    pub batch_size: usize,
    /// Commit once the pending batch holds this many content bytes
    pub max_batch_bytes: u64,
    /// Files read in parallel before being handed to the writer
    pub read_ahead: usize,
    /// Delete any existing store before building
    pub force: bool,
    /// Suppress progress output
    pub silent: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            include: vec!["*.json".to_string()],
            batch_size: 1000,
            max_batch_bytes: 50 * 1024 * 1024,
            read_ahead: 64,
            force: false,
            silent: false,
        }
    }
}

/// A file the build left out, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedFile {
    /// Record a per-file failure; the reason omits the path the entry already carries.
    pub fn from_error(path: PathBuf, err: &SearchError) -> Self {
        let reason = match err {
            SearchError::Decode { source, .. } => source.to_string(),
            SearchError::PermissionDenied(_) => "permission denied".to_string(),
            SearchError::PathNotFound(_) => "vanished during the build".to_string(),
            SearchError::Io { source, .. } => format!("read failed: {}", source),
            other => other.to_string(),
        };
        Self { path, reason }
    }
}

/// Outcome of a completed build
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub indexed: usize,
    pub skipped: Vec<SkippedFile>,
    pub pruned: usize,
    pub batches: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Metadata persisted alongside the documents
#[derive(Debug, Clone, Default)]
pub struct StoreMeta {
    pub schema_version: u32,
    pub root_path: Option<PathBuf>,
    pub include: Vec<String>,
    pub generation: Generation,
    pub created_at: u64,
    pub updated_at: u64,
    pub last_indexed: usize,
    pub last_skipped: usize,
}

/// Aggregate figures reported by `stats`
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub meta: StoreMeta,
    pub doc_count: usize,
    pub content_bytes: u64,
    pub file_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DecodeFailure;

    #[test]
    fn test_skipped_file_from_decode_error() {
        let err = SearchError::Decode {
            path: "Broken.json".into(),
            source: DecodeFailure::InvalidUtf8 { valid_up_to: 3 },
        };
        let file = SkippedFile::from_error("Broken.json".into(), &err);
        assert_eq!(file.reason, "invalid UTF-8 at byte 3");

        let err = SearchError::io(
            "/abs/Locked.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(SkippedFile::from_error("Locked.json".into(), &err).reason, "permission denied");
    }

    #[test]
    fn test_normalize_rel_path() {
        let rel: PathBuf = ["Content", "DataTable", "Weapons.json"].iter().collect();
        assert_eq!(normalize_rel_path(&rel), "Content/DataTable/Weapons.json");
        assert_eq!(normalize_rel_path(Path::new("top.json")), "top.json");
    }

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.include, vec!["*.json"]);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_batch_bytes, 50 * 1024 * 1024);
        assert!(!config.force);
    }
}
