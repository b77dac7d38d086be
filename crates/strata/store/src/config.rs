//! Store configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Store configuration, usually read from `strata.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub sync: SyncConfig,
    pub persistence: PersistenceConfig,
}

/// Push/pull behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upload pending file blobs after a successful push.
    pub upload_files: bool,
    /// Keep an overlay's error graph when the overlay is cleared explicitly.
    pub keep_errors_on_clear: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upload_files: true,
            keep_errors_on_clear: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Namespace for persisted atoms.
    pub key_prefix: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            key_prefix: "strata".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| StoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config.sync.upload_files);
        assert!(!config.sync.keep_errors_on_clear);
        assert_eq!(config.persistence.key_prefix, "strata");
    }

    #[test]
    fn test_load_missing_config() {
        let config = StoreConfig::load("/nonexistent/path/strata.toml").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\nupload_files = false").unwrap();

        let config = StoreConfig::load(file.path()).unwrap();
        assert!(!config.sync.upload_files);
        assert!(!config.sync.keep_errors_on_clear);
        assert_eq!(config.persistence.key_prefix, "strata");
    }

    #[test]
    fn test_invalid_toml() {
        let err = StoreConfig::from_toml_str("[sync\n").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
