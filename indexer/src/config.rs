//! Indexer configuration
//!
//! Loaded from a TOML file. Every field has a default so an empty file is valid.
//!
//! ```toml
//! events_path = "events.jsonl"
//! snapshot_path = "read-model.json"
//! log_filter = "info,subname_indexer=debug"
//!
//! [projector]
//! root_name = "celo.eth"
//! workers = 4
//! batch_size = 500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// JSON-lines event log to follow
    pub events_path: PathBuf,
    /// Where the read model is persisted; in-memory only when unset
    pub snapshot_path: Option<PathBuf>,
    /// Used when `RUST_LOG` is not set
    pub log_filter: String,
    pub projector: ProjectorConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            events_path: PathBuf::from("events.jsonl"),
            snapshot_path: None,
            log_filter: String::from("info"),
            projector: ProjectorConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: IndexerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.projector.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Appended to labels to build full names
    pub root_name: String,
    /// Parallel partitions; events of one node always land in the same one
    pub workers: usize,
    pub batch_size: usize,
    pub poll_interval_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            root_name: String::new(),
            workers: 4,
            batch_size: 500,
            poll_interval_ms: 1_000,
            backoff_base_ms: 100,
            backoff_max_ms: 30_000,
        }
    }
}

impl ProjectorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid(String::from(
                "projector.workers must be at least 1",
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(String::from(
                "projector.batch_size must be at least 1",
            )));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::Invalid(format!(
                "projector.backoff_base_ms ({}) exceeds backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = IndexerConfig::from_toml_str("").unwrap();
        assert_eq!(config, IndexerConfig::default());
        assert_eq!(config.projector.workers, 4);
    }

    #[test]
    fn test_written_defaults_only_hold_projector_settings() {
        let written = toml::to_string(&IndexerConfig::default()).unwrap();
        assert!(written.contains("[projector]"));
        assert!(!written.contains("gateway"));
        assert_eq!(
            IndexerConfig::from_toml_str(&written).unwrap(),
            IndexerConfig::default()
        );
    }

    #[test]
    fn test_load_with_sections() {
        let toml = r#"
            events_path = "/var/lib/subnames/events.jsonl"
            snapshot_path = "/var/lib/subnames/model.json"

            [projector]
            root_name = "celo.eth"
            workers = 2
            poll_interval_ms = 250
        "#;
        let config = IndexerConfig::from_toml_str(toml).unwrap();
        assert_eq!(
            config.snapshot_path,
            Some(PathBuf::from("/var/lib/subnames/model.json"))
        );
        assert_eq!(config.projector.root_name, "celo.eth");
        assert_eq!(config.projector.workers, 2);
        assert_eq!(config.projector.batch_size, 500);
        assert_eq!(config.projector.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        let err = IndexerConfig::from_toml_str("[projector]\nworkers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = IndexerConfig::from_toml_str(
            "[projector]\nbackoff_base_ms = 10\nbackoff_max_ms = 5",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = IndexerConfig::from_toml_str("workers = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexer.toml");
        std::fs::write(&path, "log_filter = \"debug\"\n").unwrap();
        assert_eq!(IndexerConfig::load(&path).unwrap().log_filter, "debug");

        let err = IndexerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
