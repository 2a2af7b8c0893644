//! The generative assistant seam.
//!
//! When no recipe matches, the engine asks an [`AiAdapter`] what the inputs
//! could fuse into. Adapters may be slow, fail or return nothing; the engine
//! bounds every call with [`propose_within`] and degrades to a placeholder.

mod ideas;
mod prompting;
mod scripted;

pub use ideas::*;
pub use prompting::*;
pub use scripted::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One fusion idea proposed by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiIdea {
    /// Display name, derived from the description when the assistant gave none.
    pub name: String,
    /// Free-text description of the fused result.
    pub results_text: String,
    /// Image prompt for the card icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_prompt: Option<String>,
}

impl AiIdea {
    pub fn new(name: impl Into<String>, results_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results_text: results_text.into(),
            icon_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("assistant unavailable: {0}")]
    Unavailable(String),
    #[error("assistant timed out after {0:?}")]
    TimedOut(Duration),
    #[error("assistant returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("assistant returned no ideas")]
    NoIdeas,
}

/// A generative assistant that proposes fusion results for card names.
#[async_trait]
pub trait AiAdapter: Send + Sync {
    async fn propose(&self, input_names: &[String]) -> Result<Vec<AiIdea>, AdapterError>;
}

/// Adapter for deployments without an assistant. Every call fails, so AI mode
/// always yields placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdapter;

#[async_trait]
impl AiAdapter for DisabledAdapter {
    async fn propose(&self, _input_names: &[String]) -> Result<Vec<AiIdea>, AdapterError> {
        Err(AdapterError::Unavailable("assistant is disabled".into()))
    }
}

/// Call `adapter`, giving up after `timeout`.
pub async fn propose_within(
    adapter: &dyn AiAdapter,
    input_names: &[String],
    timeout: Duration,
) -> Result<Vec<AiIdea>, AdapterError> {
    match tokio::time::timeout(timeout, adapter.propose(input_names)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::TimedOut(timeout)),
    }
}
