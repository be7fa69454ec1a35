// Q9 Lookup Dataset Configuration
// Locates the dataset file and describes what was loaded

use crate::types::{LookupError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Dataset location used when no configuration says otherwise
pub const DEFAULT_DATASET_PATH: &str = "files/dataset.db";

/// Default time to wait on a locked database file
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Candidates shown per page by the input session
pub const PAGE_SIZE: usize = 9;

/// Service configuration
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// # use q9_lookup::data::LookupConfig;
/// let config = LookupConfig::from_json_str(r#"{ "simplified_output": true }"#).unwrap();
/// assert!(config.simplified_output);
/// assert_eq!(config.dataset_path.to_str(), Some("files/dataset.db"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Path of the SQLite dataset file
    pub dataset_path: PathBuf,

    /// How long a query waits on a locked file, in milliseconds
    pub busy_timeout_ms: u64,

    /// Convert committed text to simplified characters
    pub simplified_output: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            simplified_output: false,
        }
    }
}

impl LookupConfig {
    /// Configuration pointing at `path`, other fields defaulted
    pub fn with_dataset(path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: path.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    ///
    /// Relative dataset paths are resolved against the config file's
    /// directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;

        if config.dataset_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.dataset_path = dir.join(&config.dataset_path);
            }
        }
        Ok(config)
    }

    /// Reject values the service cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(LookupError::Config("dataset_path is empty".to_string()));
        }
        Ok(())
    }
}

/// Row counts of the loaded dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetInfo {
    /// Rows in `mapped_table`
    pub mapped_rows: usize,
    /// Rows in `related_candidates_table`
    pub related_rows: usize,
    /// Rows in `word_meta`
    pub phonetic_rows: usize,
    /// Rows in `ts_chinese_table`
    pub simplification_rows: usize,
}

impl DatasetInfo {
    /// Total rows across all four tables
    pub fn total_rows(&self) -> usize {
        self.mapped_rows + self.related_rows + self.phonetic_rows + self.simplification_rows
    }
}
