//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Tunables of the synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on one assistant call, in milliseconds.
    pub adapter_timeout_ms: u64,

    /// Surface assistant failures as errors instead of building a placeholder.
    pub strict_ai: bool,

    /// Maximum number of cards in one fusion.
    pub max_inputs: usize,

    /// Ceiling for the tier of AI-invented cards, before era limits.
    pub max_ai_tier: u32,

    /// Add unlocked reward and era cards to the inventory on commit, instead
    /// of queueing them as pending grants.
    pub grant_unlocks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: 8_000,
            strict_ai: false,
            max_inputs: 6,
            max_ai_tier: 10,
            grant_unlocks: false,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML; missing keys keep their defaults.
    pub fn from_toml_str(toml_text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adapter_timeout_ms == 0 {
            return Err(ConfigError::Invalid("adapter_timeout_ms must be positive".into()));
        }
        if self.max_inputs < 2 {
            return Err(ConfigError::Invalid("max_inputs must be at least 2".into()));
        }
        if self.max_ai_tier == 0 {
            return Err(ConfigError::Invalid("max_ai_tier must be positive".into()));
        }
        Ok(())
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}
