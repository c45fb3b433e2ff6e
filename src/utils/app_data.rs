use crate::error::{Result, SearchError};
use crate::index::types::IndexConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "dumpsearch";
const CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "store.db";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Documents per committed batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Content bytes that force an early commit
    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: u64,

    /// File-name globs selecting content files
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Matching lines shown per file
    #[serde(default = "default_snippet_lines")]
    pub snippet_lines: usize,

    /// Longest line printed before it is cut around the match
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,
}

fn default_batch_size() -> usize {
    IndexConfig::default().batch_size
}

fn default_max_batch_bytes() -> u64 {
    IndexConfig::default().max_batch_bytes
}

fn default_include() -> Vec<String> {
    IndexConfig::default().include
}

fn default_snippet_lines() -> usize {
    3
}

fn default_max_columns() -> usize {
    240
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_batch_bytes: default_max_batch_bytes(),
            include: default_include(),
            snippet_lines: default_snippet_lines(),
            max_columns: default_max_columns(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from an explicit file, defaulting when it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| SearchError::io(config_path, e))?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            SearchError::Config(format!("{}: {}", config_path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SearchError::Config("batch_size must be at least 1".into()));
        }
        if self.max_batch_bytes == 0 {
            return Err(SearchError::Config("max_batch_bytes must be at least 1".into()));
        }
        if self.include.is_empty() {
            return Err(SearchError::Config("include must list at least one pattern".into()));
        }
        Ok(())
    }

    /// Build settings derived from this config
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            include: self.include.clone(),
            batch_size: self.batch_size,
            max_batch_bytes: self.max_batch_bytes,
            ..IndexConfig::default()
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base =
        base.ok_or_else(|| SearchError::Config("could not determine app data directory".into()))?;
    Ok(base.join(APP_NAME))
}

/// Default location of the store when none is given
pub fn default_store_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.include, vec!["*.json"]);
        assert_eq!(config.snippet_lines, 3);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"batch_size": 250}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.batch_size, 250);
        assert_eq!(config.max_batch_bytes, 50 * 1024 * 1024);
        assert_eq!(config.include, vec!["*.json"]);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp.path().join("config.json")).unwrap();
        assert_eq!(config.batch_size, 1000);
    }

    #[test]
    fn test_load_rejects_zero_batch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"batch_size": 0}"#).unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(SearchError::Config(_))));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(SearchError::Config(_))));
    }

    #[test]
    fn test_index_config_carries_overrides() {
        let config = AppConfig {
            include: vec!["*.json".into(), "*.ini".into()],
            batch_size: 10,
            ..AppConfig::default()
        };
        let index = config.index_config();
        assert_eq!(index.batch_size, 10);
        assert_eq!(index.include.len(), 2);
    }

    #[test]
    fn test_default_store_path_file_name() {
        if let Ok(path) = default_store_path() {
            assert!(path.ends_with("dumpsearch/store.db"));
        }
    }
}
