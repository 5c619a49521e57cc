//! Global configuration model for Quokka.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuokkaError, Result};

/// Root configuration for the Quokka build pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuokkaConfig {
    /// Path to the local library catalog.
    pub catalog: PathBuf,
    /// Base URL of a remote library; takes precedence over the catalog when set.
    pub registry_url: Option<String>,
    /// Whether offline mode is enabled (refuses remote lookups).
    pub offline: bool,
    /// Timeout for a single remote lookup, in seconds.
    pub timeout_secs: u64,
    /// Whether library answers are memoized for the lifetime of the process.
    pub cache: bool,
}

impl Default for QuokkaConfig {
    fn default() -> Self {
        Self {
            catalog: crate::constants::default_catalog_file(),
            registry_url: None,
            offline: false,
            timeout_secs: crate::constants::DEFAULT_TIMEOUT_SECS,
            cache: true,
        }
    }
}

impl QuokkaConfig {
    /// Loads configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the loaded values fail [`QuokkaConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| QuokkaError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Config` for a zero timeout or a registry URL
    /// without an `http(s)://` scheme.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(QuokkaError::Config {
                message: "timeout_secs must be greater than zero".into(),
            });
        }
        if let Some(url) = &self.registry_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(QuokkaError::Config {
                    message: format!("unsupported registry URL scheme: {url}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let config = QuokkaConfig::load(&dir.path().join("absent.json")).expect("load failed");
        assert_eq!(config, QuokkaConfig::default());
    }

    #[test]
    fn load_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "offline": true, "timeout_secs": 3 }"#).expect("write");

        let config = QuokkaConfig::load(&path).expect("load failed");
        assert!(config.offline);
        assert_eq!(config.timeout_secs, 3);
        assert!(config.cache);
        assert!(config.registry_url.is_none());
    }

    #[test]
    fn load_rejects_zero_timeout() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "timeout_secs": 0 }"#).expect("write");
        assert!(QuokkaConfig::load(&path).is_err());
    }

    #[test]
    fn validate_rejects_unknown_url_scheme() {
        let config = QuokkaConfig {
            registry_url: Some("ftp://library.example".into()),
            ..QuokkaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_malformed_json_is_serialization_error() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = QuokkaConfig::load(&path).unwrap_err();
        assert!(matches!(err, QuokkaError::Serialization { .. }), "got: {err}");
    }
}
