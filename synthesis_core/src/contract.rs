//! JSON boundary for client collaborators.
//!
//! Requests and responses use camelCase field names. Failures are reported as
//! `{"errorKind": ..., "message": ...}`.

use card_rules::{Card, CardInstanceId, PlayerId, SynthesisSource};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::adapter::AiIdea;
use crate::error::{ErrorKind, SynthesisError};
use crate::orchestrator::{AttemptPhase, SynthesisEngine};
use crate::progression::ProgressionEffect;
use crate::repository::CardRepository;

/// How to resolve inputs that match no recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// Recipes only; no match is an error.
    #[default]
    Deterministic,
    /// Fall back to the generative assistant.
    Ai,
}

/// One fusion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    /// Held card instances to fuse.
    pub inputs: Vec<CardInstanceId>,
    #[serde(default)]
    pub mode: SynthesisMode,
    /// Compute the result without changing any state.
    #[serde(default)]
    pub preview: bool,
    /// Player-chosen name for an AI or placeholder result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SynthesisRequest {
    pub fn deterministic(inputs: Vec<CardInstanceId>) -> Self {
        Self {
            inputs,
            mode: SynthesisMode::Deterministic,
            preview: false,
            name: None,
        }
    }

    pub fn ai(inputs: Vec<CardInstanceId>) -> Self {
        Self {
            mode: SynthesisMode::Ai,
            ..Self::deterministic(inputs)
        }
    }

    pub fn previewing(mut self) -> Self {
        self.preview = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    pub output: Card,

    /// Assistant ideas, present when the assistant was consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideas: Option<Vec<AiIdea>>,

    /// Present only when the commit changed era progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<ProgressionEffect>,

    pub preview: bool,

    /// The output is a placeholder because the assistant gave nothing usable.
    pub degraded: bool,

    pub source: SynthesisSource,

    /// Active era the attempt ran in.
    pub era: String,

    /// Inventory instance of the committed output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<CardInstanceId>,

    /// Phases the attempt went through.
    #[serde(skip)]
    pub phases: Vec<AttemptPhase>,
}

/// Failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: ErrorKind,
    pub message: String,
}

impl From<&SynthesisError> for ErrorResponse {
    fn from(err: &SynthesisError) -> Self {
        Self {
            error_kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        error!(error = %err, "Failed to serialize synthesis reply");
        r#"{"errorKind":"StorageUnavailable","message":"failed to serialize reply"}"#.to_string()
    })
}

impl<R: CardRepository> SynthesisEngine<R> {
    /// Handle a JSON request body and produce a JSON reply.
    ///
    /// Malformed bodies are reported as `InvalidInput`.
    pub async fn handle_json(&self, player: PlayerId, body: &str) -> String {
        let request: SynthesisRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                return to_json(&ErrorResponse {
                    error_kind: ErrorKind::InvalidInput,
                    message: format!("malformed request: {err}"),
                });
            }
        };

        match self.synthesize(player, request).await {
            Ok(response) => to_json(&response),
            Err(err) => to_json(&ErrorResponse::from(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::DisabledAdapter;
    use crate::repository::InMemoryRepository;
    use card_rules::Codex;
    use serde_json::Value;
    use std::sync::Arc;

    async fn engine() -> (SynthesisEngine<InMemoryRepository>, PlayerId) {
        let codex = Arc::new(Codex::builtin().unwrap());
        let repository = InMemoryRepository::new();
        let player = repository.seed_player(&codex).await;
        let engine = SynthesisEngine::new(codex, repository, Arc::new(DisabledAdapter));
        (engine, player)
    }

    async fn instance_of(
        engine: &SynthesisEngine<InMemoryRepository>,
        player: PlayerId,
        name: &str,
    ) -> CardInstanceId {
        let state = engine.repository().snapshot(player).await.unwrap();
        state.inventory.instances_of(name)[0]
    }

    #[test]
    fn test_request_defaults() {
        let id = CardInstanceId::new();
        let body = format!(r#"{{"inputs": ["{id}", "{id}"]}}"#);
        let request: SynthesisRequest = serde_json::from_str(&body).unwrap();

        assert_eq!(request.mode, SynthesisMode::Deterministic);
        assert!(!request.preview);
        assert!(request.name.is_none());
    }

    #[tokio::test]
    async fn test_handle_json_success() {
        let (engine, player) = engine().await;
        let wood = instance_of(&engine, player, "木头").await;
        let stone = instance_of(&engine, player, "石头").await;

        let body =
            serde_json::json!({"inputs": [wood, stone], "mode": "deterministic"}).to_string();
        let reply: Value = serde_json::from_str(&engine.handle_json(player, &body).await).unwrap();

        assert_eq!(reply["output"]["name"], "火");
        assert_eq!(reply["progression"]["eventResolved"], "寒冷");
        assert_eq!(reply["preview"], false);
        assert_eq!(reply["degraded"], false);
        assert_eq!(reply["era"], "生存时代");
        assert!(reply["instance"].is_string());
    }

    #[tokio::test]
    async fn test_handle_json_failures() {
        let (engine, player) = engine().await;

        let reply: Value =
            serde_json::from_str(&engine.handle_json(player, "{not json").await).unwrap();
        assert_eq!(reply["errorKind"], "InvalidInput");

        let human = engine.repository().snapshot(player).await.unwrap().inventory.instances_of("人");
        let body = serde_json::json!({"inputs": [human[0], human[1]]}).to_string();
        let reply: Value = serde_json::from_str(&engine.handle_json(player, &body).await).unwrap();
        assert_eq!(reply["errorKind"], "NoRecipe");
        assert!(reply["message"].as_str().unwrap().contains("人+人"));
    }

    #[tokio::test]
    async fn test_handle_json_degraded_ai() {
        let (engine, player) = engine().await;
        let human = engine.repository().snapshot(player).await.unwrap().inventory.instances_of("人");

        let body = serde_json::json!({
            "inputs": [human[0], human[1]],
            "mode": "ai",
            "preview": true,
        })
        .to_string();
        let reply: Value = serde_json::from_str(&engine.handle_json(player, &body).await).unwrap();

        assert_eq!(reply["output"]["name"], "人+人");
        assert_eq!(reply["degraded"], true);
        assert_eq!(reply["preview"], true);
        assert_eq!(reply["source"], "placeholder");
        assert!(reply.get("progression").is_none());
    }
}
