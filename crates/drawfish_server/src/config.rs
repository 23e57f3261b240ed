//! Server configuration loaded from TOML.

use crate::oracle::ProcessOracle;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Top-level configuration for the drawfish server.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Move oracle process settings.
    #[serde(default)]
    oracle: OracleConfig,
}

/// Settings for the external move-selection process.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Command to invoke (as array); the position FEN is appended as the
    /// final argument.
    #[serde(default = "default_command")]
    command: Vec<String>,

    /// How long the oracle may run before it is killed, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_command() -> Vec<String> {
    vec!["python3".to_string(), "predict_move.py".to_string()]
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!(
                "Config file not found at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            oracle: OracleConfig::default(),
        }
    }
}

impl OracleConfig {
    /// Builds the process oracle described by this configuration.
    #[instrument(skip(self), fields(command = ?self.command))]
    pub fn build(&self) -> Result<ProcessOracle, ConfigError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| ConfigError::new("Oracle command must not be empty".to_string()))?;
        Ok(ProcessOracle::new(
            program.clone(),
            args.to_vec(),
            Duration::from_millis(self.timeout_ms),
        ))
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
            host = "0.0.0.0"
            port = 8080

            [oracle]
            command = ["stockfish-wrapper", "--depth", "12"]
            timeout_ms = 3000
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.oracle().command().len(), 3);
        assert_eq!(*config.oracle().timeout_ms(), 3000);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.port(), 5000);
        assert_eq!(
            config.oracle().command(),
            &vec!["python3".to_string(), "predict_move.py".to_string()]
        );
        assert_eq!(*config.oracle().timeout_ms(), 15_000);
    }

    #[test]
    fn test_partial_oracle_section() {
        let toml = r#"
            [oracle]
            timeout_ms = 500
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(*config.oracle().timeout_ms(), 500);
        assert_eq!(config.oracle().command()[0], "python3");
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 6001").unwrap();
        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(*config.port(), 6001);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load_or_default(dir.path().join("missing.toml")).unwrap();
        assert_eq!(*config.port(), 5000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(ServerConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_empty_oracle_command_rejected() {
        let toml = r#"
            [oracle]
            command = []
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        let err = config.oracle().build().unwrap_err();
        assert!(err.message.contains("must not be empty"));
    }
}
