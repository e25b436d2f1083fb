//! Configuration management utilities
//!
//! Every component reads its settings from the process environment through
//! the helpers here, then validates them in its own config builder.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Error raised while reading configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-analyst".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load from `APP_NAME` / `APP_ENV`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: env_or("APP_NAME", &defaults.app_name),
            environment: env_or("APP_ENV", &defaults.environment),
        }
    }

    /// Whether the process runs in production.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Read an environment variable, returning `default` when unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable into `T`.
///
/// Returns `Ok(None)` when the variable is unset or empty and an error when
/// it is set to something that does not parse.
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        _ => Ok(None),
    }
}
