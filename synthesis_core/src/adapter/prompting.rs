//! Prompt-based adapter over a plain text completion backend.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{format_combination, parse_combinations, AdapterError, AiAdapter, AiIdea};

/// A text completion backend (a chat model endpoint, a local model, ...).
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AdapterError>;
}

/// Turns card names into a prompt and the backend's JSON reply into ideas.
pub struct PromptingAdapter<C> {
    client: C,
    min_ideas: usize,
}

impl<C: CompletionClient> PromptingAdapter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            min_ideas: 3,
        }
    }

    /// Number of ideas the prompt asks for.
    pub fn with_min_ideas(mut self, min_ideas: usize) -> Self {
        self.min_ideas = min_ideas.max(1);
        self
    }

    pub fn build_prompt(&self, input_names: &[String]) -> String {
        [
            format!(
                "我在做一个游戏，我需要你用json格式回复我：{}可以合成什么东西。",
                format_combination(input_names)
            ),
            "你需要想象所有可能合成的东西，可以是现实的、魔法的、科幻的、魔幻的等等所有能想象到的内容。".to_string(),
            "请确保只返回一个JSON，格式如下：".to_string(),
            "{".to_string(),
            "  \"combinations\": [".to_string(),
            "    {\"results\": \"...\", \"prompt\": \"...\"}".to_string(),
            "  ]".to_string(),
            "}".to_string(),
            "要求：".to_string(),
            format!("1. 至少给出{}个不同的合成结果设想；", self.min_ideas),
            "2. results 使用中文详细描述每个合成物，prompt 填写用于生成图标的中文提示词；".to_string(),
            "3. 不要输出JSON以外的任何多余文字。".to_string(),
        ]
        .join("\n")
    }
}

#[async_trait]
impl<C: CompletionClient> AiAdapter for PromptingAdapter<C> {
    async fn propose(&self, input_names: &[String]) -> Result<Vec<AiIdea>, AdapterError> {
        let prompt = self.build_prompt(input_names);
        let reply = self.client.complete(&prompt).await?;
        if reply.trim().is_empty() {
            return Err(AdapterError::NoIdeas);
        }

        let ideas = parse_combinations(&reply, input_names).map_err(|err| {
            warn!(error = %err, "Could not parse assistant reply");
            err
        })?;
        if ideas.is_empty() {
            return Err(AdapterError::NoIdeas);
        }

        debug!(count = ideas.len(), "Assistant proposed ideas");
        Ok(ideas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedClient {
        reply: Result<String, AdapterError>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(&self, prompt: &str) -> Result<String, AdapterError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn names() -> Vec<String> {
        vec!["人".to_string(), "石头".to_string()]
    }

    #[test]
    fn test_prompt_mentions_inputs() {
        let adapter = PromptingAdapter::new(CannedClient::replying("")).with_min_ideas(2);
        let prompt = adapter.build_prompt(&names());
        assert!(prompt.contains("「人」和「石头」"));
        assert!(prompt.contains("至少给出2个"));
        assert!(prompt.contains("\"combinations\""));
    }

    #[tokio::test]
    async fn test_propose_parses_reply() {
        let client = CannedClient::replying(
            "```json\n{\"combinations\":[{\"results\":\"石斧：锋利的工具\",\"prompt\":\"stone axe\"}]}\n```",
        );
        let adapter = PromptingAdapter::new(client);

        let ideas = adapter.propose(&names()).await.unwrap();
        assert_eq!(ideas, vec![AiIdea {
            name: "石斧".into(),
            results_text: "石斧：锋利的工具".into(),
            icon_prompt: Some("stone axe".into()),
        }]);
        assert_eq!(adapter.client.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_propose_empty_or_malformed() {
        let empty = PromptingAdapter::new(CannedClient::replying("  "));
        assert_eq!(empty.propose(&names()).await, Err(AdapterError::NoIdeas));

        let no_ideas = PromptingAdapter::new(CannedClient::replying("{\"combinations\": []}"));
        assert_eq!(no_ideas.propose(&names()).await, Err(AdapterError::NoIdeas));

        let prose = PromptingAdapter::new(CannedClient::replying("可以合成石斧"));
        assert!(matches!(
            prose.propose(&names()).await,
            Err(AdapterError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_propose_forwards_client_failure() {
        let client = CannedClient {
            reply: Err(AdapterError::Unavailable("quota exceeded".into())),
            prompts: Mutex::new(Vec::new()),
        };
        let adapter = PromptingAdapter::new(client);
        assert!(matches!(
            adapter.propose(&names()).await,
            Err(AdapterError::Unavailable(_))
        ));
    }
}
