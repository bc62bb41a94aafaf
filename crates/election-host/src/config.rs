//! Host configuration with TOML file support.

use crate::{HostError, LogFormat};
use election_core::Identity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an election host.
///
/// Loaded from a TOML file via [`HostConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Identity that administers the election.
    #[serde(default = "default_administrator")]
    pub administrator: Identity,

    /// Directory for election.json and events.jsonl. In-memory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_administrator() -> Identity {
    Identity::from("admin")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HostError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, HostError> {
        toml::from_str(s).map_err(|e| HostError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, HostError> {
        toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            administrator: default_administrator(),
            data_dir: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = HostConfig::from_toml_str("").unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn parses_all_keys() {
        let config = HostConfig::from_toml_str(
            r#"
            administrator = "registrar"
            data_dir = "/var/lib/election"
            log_level = "debug"
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.administrator, Identity::from("registrar"));
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/election")));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let err = HostConfig::from_toml_str(r#"log_format = "xml""#).unwrap_err();
        assert_eq!(err.code(), "config");
    }

    #[test]
    fn toml_round_trip() {
        let config = HostConfig {
            data_dir: Some(PathBuf::from("data")),
            ..HostConfig::default()
        };

        let text = config.to_toml_string().unwrap();
        assert_eq!(HostConfig::from_toml_str(&text).unwrap(), config);
    }
}
