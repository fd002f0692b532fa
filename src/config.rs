//! Runtime configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! { "row_index_policy": "normalize", "history_limit": 50, "log_level": "warn" }
//! ```
//!
//! No file means defaults. A file that exists but does not parse or
//! validate is an error; nothing falls back silently.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extension::RowIndexPolicy;
use crate::observability::{log_event_with_fields, Event, Severity};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "ROWSPLICE_CONFIG_READ_FAILED",
            ConfigError::Parse { .. } => "ROWSPLICE_CONFIG_PARSE_FAILED",
            ConfigError::Invalid(_) => "ROWSPLICE_CONFIG_INVALID",
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How out-of-order row indices are treated when building a change
    #[serde(default)]
    pub row_index_policy: RowIndexPolicy,

    /// Maximum number of undoable entries (unbounded when absent)
    #[serde(default = "default_history_limit")]
    pub history_limit: Option<usize>,

    /// Log lines below this severity are dropped
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_history_limit() -> Option<usize> {
    None
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for Config {
    fn default() -> Self {
        Self {
            row_index_policy: RowIndexPolicy::default(),
            history_limit: default_history_limit(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let Some(path) = path else {
            let config = Self::default();
            config.log_loaded("<defaults>");
            return Ok(config);
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        config.log_loaded(&path.display().to_string());
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "history_limit must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    fn log_loaded(&self, source: &str) {
        let policy = match self.row_index_policy {
            RowIndexPolicy::Reject => "reject",
            RowIndexPolicy::Normalize => "normalize",
        };
        let limit = self
            .history_limit
            .map_or_else(|| "unbounded".to_string(), |limit| limit.to_string());
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("history_limit", limit.as_str()),
                ("log_level", self.log_level.as_str()),
                ("row_index_policy", policy),
                ("source", source),
            ],
        );
    }
}
