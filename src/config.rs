//! Runtime configuration loaded from `jsprimer.toml`.
//!
//! ```toml
//! [runner]
//! max_call_depth = 1000
//! max_steps = 1000000
//!
//! [log]
//! level = "warn"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::runner::plugin::types::ExecutionLimits;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "jsprimer.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runner: RunnerConfig,
    pub log: LogConfig,
}

/// Limits applied to every snippet run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub max_call_depth: usize,
    pub max_steps: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let limits = ExecutionLimits::default();
        RunnerConfig {
            max_call_depth: limits.max_call_depth,
            max_steps: limits.max_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// A `tracing` filter directive.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `None`.
    /// A missing file yields the defaults; an unreadable or malformed one
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config
            .limits()
            .validate()
            .map_err(|message| ConfigError::Invalid {
                path: path.clone(),
                message,
            })?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_call_depth: self.runner.max_call_depth,
            max_steps: self.runner.max_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::plugin::types::MAX_CALL_DEPTH_LIMIT;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.limits(), ExecutionLimits::default());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_runner_section() {
        let config = Config::parse("[runner]\nmax_steps = 500\n").unwrap();
        assert_eq!(config.runner.max_steps, Some(500));
        assert_eq!(config.runner.max_call_depth, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\nmax_call_depth = 8\n\n[log]\nlevel = \"debug\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.runner.max_call_depth, 8);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner\nmax_call_depth = ").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unsupported_limits_are_rejected() {
        for body in [
            "[runner]\nmax_call_depth = 0",
            "[runner]\nmax_call_depth = 1000000",
            "[runner]\nmax_steps = 0",
        ] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "{}", body).unwrap();
            let err = Config::load(Some(file.path())).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{}", body);
        }
    }

    #[test]
    fn test_default_limits_are_valid() {
        assert!(ExecutionLimits::default().validate().is_ok());
        let deepest = ExecutionLimits {
            max_call_depth: MAX_CALL_DEPTH_LIMIT,
            max_steps: Some(1),
        };
        assert!(deepest.validate().is_ok());
    }
}
