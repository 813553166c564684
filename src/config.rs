//! Configuration module for CABINET.

use serde::Deserialize;
use std::path::Path;

use crate::{CabinetError, Result};

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the collection files (folders.json, files.json).
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "data/store".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Local blob store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Directory holding blob content, sharded by handle prefix.
    #[serde(default = "default_blob_path")]
    pub storage_path: String,
}

fn default_blob_path() -> String {
    "data/blobs".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            storage_path: default_blob_path(),
        }
    }
}

/// Namespace policy configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NamespaceConfig {
    /// Treat sibling names that differ only in case as duplicates.
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/cabinet.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Document store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Blob store configuration.
    #[serde(default)]
    pub blobs: BlobConfig,
    /// Namespace policy.
    #[serde(default)]
    pub namespace: NamespaceConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CabinetError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CabinetError::Config(format!("config parse error: {e}")))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if a storage directory is left empty.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.trim().is_empty() {
            return Err(CabinetError::Config(
                "store.path must not be empty".to_string(),
            ));
        }
        if self.blobs.storage_path.trim().is_empty() {
            return Err(CabinetError::Config(
                "blobs.storage_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.store.path, "data/store");
        assert_eq!(config.blobs.storage_path, "data/blobs");
        assert!(!config.namespace.case_insensitive);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/cabinet.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [store]
            path = "/var/lib/cabinet/store"

            [blobs]
            storage_path = "/var/lib/cabinet/blobs"

            [namespace]
            case_insensitive = true

            [logging]
            level = "debug"
            file = "/var/log/cabinet.log"
        "#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.store.path, "/var/lib/cabinet/store");
        assert_eq!(config.blobs.storage_path, "/var/lib/cabinet/blobs");
        assert!(config.namespace.case_insensitive);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "/var/log/cabinet.log");
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let toml = r#"
            [namespace]
            case_insensitive = true
        "#;

        let config = Config::parse(toml).unwrap();

        assert!(config.namespace.case_insensitive);
        assert_eq!(config.store.path, "data/store");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.store.path, "data/store");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("store = not toml");
        assert!(matches!(result, Err(CabinetError::Config(_))));
    }

    #[test]
    fn test_validate_empty_store_path() {
        let mut config = Config::default();
        config.store.path = "  ".to_string();

        assert!(matches!(
            config.validate(),
            Err(CabinetError::Config(_))
        ));
    }

    #[test]
    fn test_validate_empty_blob_path() {
        let mut config = Config::default();
        config.blobs.storage_path = String::new();

        assert!(matches!(
            config.validate(),
            Err(CabinetError::Config(_))
        ));
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cabinet.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.store.path, "data/store");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("does/not/exist.toml");
        assert!(matches!(result, Err(CabinetError::Io(_))));
    }
}
