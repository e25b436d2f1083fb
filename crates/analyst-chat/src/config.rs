//! Chat configuration

use crate::error::{ChatError, Result};
use analyst_utils::{env_or, env_parse};
use serde::{Deserialize, Serialize};

/// Model used when `OPENAI_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Settings shared by the orchestrator and the analysis generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model identifier sent with every completion
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature; provider default when unset
    pub temperature: Option<f32>,

    /// Tool-execution rounds allowed per chat before the reply is cut short
    pub max_tool_rounds: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: None,
            max_tool_rounds: 10,
        }
    }
}

impl ChatConfig {
    /// Read `OPENAI_MODEL`, `CHAT_MAX_TOKENS`, `CHAT_TEMPERATURE` and
    /// `CHAT_MAX_TOOL_ROUNDS`
    pub fn from_env() -> Result<Self> {
        let to_config_err = |e: analyst_utils::ConfigError| ChatError::Config(e.to_string());
        let defaults = Self::default();

        let config = Self {
            model: env_or("OPENAI_MODEL", &defaults.model),
            max_tokens: env_parse("CHAT_MAX_TOKENS")
                .map_err(to_config_err)?
                .unwrap_or(defaults.max_tokens),
            temperature: env_parse("CHAT_TEMPERATURE").map_err(to_config_err)?,
            max_tool_rounds: env_parse("CHAT_MAX_TOOL_ROUNDS")
                .map_err(to_config_err)?
                .unwrap_or(defaults.max_tool_rounds),
        };
        config.validate()?;
        Ok(config)
    }

    /// Use another model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Change the tool round cap
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ChatError::Config("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ChatError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if let Some(t) = self.temperature.filter(|t| !(0.0..=2.0).contains(t)) {
            return Err(ChatError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {t}"
            )));
        }
        Ok(())
    }
}
