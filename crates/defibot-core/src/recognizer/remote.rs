//! Remote recognizer — delegates classification to an LLM.
//!
//! One user message with a fixed instruction prompt is sent per utterance.
//! The model must answer with a bare JSON object; anything else counts as
//! "no intent".

use async_trait::async_trait;
use tracing::{debug, warn};

use super::IntentRecognizer;
use crate::intent::Recognition;
use crate::provider::types::ChatMessage;
use crate::provider::LlmProvider;

/// Why a remote recognition attempt produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("LLM request failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("LLM returned no content")]
    EmptyResponse,
    #[error("LLM response is not valid recognition JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

const PROMPT_TEMPLATE: &str = r#"You are a helpful AI assistant specialized in understanding DeFi user intents and extracting entities.
User input: "{input}"
Reply ONLY with a JSON object with fields:
{
  "intent": one of ["create_pool", "create_token", "join_pool", "query_info", "general_help", null],
  "entities": {
    "token1": string or null,
    "token2": string or null,
    "apy": string or null,
    "token_name": string or null,
    "supply": string or null,
    "pool_id": string or null,
    "entity_type": string or null,
    "entity_id": string or null
  }
}
Ensure valid JSON without extra text."#;

pub struct RemoteRecognizer {
    provider: Box<dyn LlmProvider>,
    model: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl RemoteRecognizer {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: None,
            max_tokens: 150,
            temperature: 0.0,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn build_prompt(text: &str) -> String {
        PROMPT_TEMPLATE.replace("{input}", &text.replace('"', "\\\""))
    }

    /// Recognize, keeping the failure reason.
    pub async fn try_recognize(&self, text: &str) -> Result<Recognition, RecognitionError> {
        let messages = [ChatMessage::user(&Self::build_prompt(text))];
        let response = self
            .provider
            .chat(&messages, self.model.as_deref(), self.max_tokens, self.temperature)
            .await
            .map_err(RecognitionError::Transport)?;

        let content = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(RecognitionError::EmptyResponse)?;

        debug!(raw = %content, "LLM recognition response");
        parse_recognition(&content)
    }
}

/// Parse model output, tolerating a surrounding Markdown code fence.
pub fn parse_recognition(content: &str) -> Result<Recognition, RecognitionError> {
    let body = strip_code_fence(content.trim());
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop an info string such as `json` on the opening fence line.
    match rest.split_once('\n') {
        Some((first, body)) if !first.trim_start().starts_with('{') => body.trim(),
        _ => rest.trim(),
    }
}

#[async_trait]
impl IntentRecognizer for RemoteRecognizer {
    async fn recognize(&self, text: &str) -> Recognition {
        match self.try_recognize(text).await {
            Ok(recognition) => recognition,
            Err(e) => {
                warn!(error = %e, "Remote recognition failed, treating as no intent");
                Recognition::none()
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::provider::types::LlmResponse;
    use std::sync::Mutex;

    /// Returns a canned answer and records the prompts it was sent.
    struct MockProvider {
        reply: Result<Option<String>, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(Some(content.to_string())),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _model: Option<&str>,
            max_tokens: u32,
            temperature: f32,
        ) -> anyhow::Result<LlmResponse> {
            assert_eq!(max_tokens, 150);
            assert_eq!(temperature, 0.0);
            self.prompts
                .lock()
                .unwrap()
                .extend(messages.iter().map(|m| m.content.clone()));
            match &self.reply {
                Ok(content) => Ok(LlmResponse {
                    content: content.clone(),
                    ..Default::default()
                }),
                Err(msg) => Err(anyhow::anyhow!("{msg}")),
            }
        }

        fn default_model(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_parses_json_reply() {
        let provider = MockProvider::replying(
            r#"{"intent": "join_pool", "entities": {"pool_id": "42", "token1": null}}"#,
        );
        let rec = RemoteRecognizer::new(Box::new(provider)).recognize("join 42").await;
        assert_eq!(rec.intent, Some(Intent::JoinPool));
        assert_eq!(rec.entities.get("pool_id"), Some("42"));
    }

    #[tokio::test]
    async fn test_prompt_embeds_input() {
        let provider = std::sync::Arc::new(MockProvider::replying(r#"{"intent": null, "entities": {}}"#));

        struct Shared(std::sync::Arc<MockProvider>);

        #[async_trait]
        impl LlmProvider for Shared {
            async fn chat(
                &self,
                messages: &[ChatMessage],
                model: Option<&str>,
                max_tokens: u32,
                temperature: f32,
            ) -> anyhow::Result<LlmResponse> {
                self.0.chat(messages, model, max_tokens, temperature).await
            }

            fn default_model(&self) -> &str {
                "mock"
            }
        }

        let recognizer = RemoteRecognizer::new(Box::new(Shared(provider.clone())));
        let rec = recognizer.recognize("say \"hi\"").await;
        assert_eq!(rec, Recognition::none());

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(r#"User input: "say \"hi\"""#));
        assert!(prompts[0].contains("\"entity_id\": string or null"));
    }

    #[tokio::test]
    async fn test_code_fenced_reply() {
        let provider = MockProvider::replying(
            "```json\n{\"intent\": \"general_help\", \"entities\": {}}\n```",
        );
        let rec = RemoteRecognizer::new(Box::new(provider)).recognize("help").await;
        assert_eq!(rec.intent, Some(Intent::GeneralHelp));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_none() {
        let provider = MockProvider::replying("Sure! The intent is create_pool.");
        let recognizer = RemoteRecognizer::new(Box::new(provider));
        assert!(matches!(
            recognizer.try_recognize("x").await,
            Err(RecognitionError::Malformed(_))
        ));
        assert_eq!(recognizer.recognize("x").await, Recognition::none());
    }

    #[tokio::test]
    async fn test_unknown_intent_is_none() {
        let provider = MockProvider::replying(r#"{"intent": "create_vault", "entities": {}}"#);
        let rec = RemoteRecognizer::new(Box::new(provider)).recognize("vault").await;
        assert_eq!(rec, Recognition::none());
    }

    #[tokio::test]
    async fn test_transport_error_is_none() {
        let recognizer = RemoteRecognizer::new(Box::new(MockProvider::failing("connection refused")));
        assert!(matches!(
            recognizer.try_recognize("x").await,
            Err(RecognitionError::Transport(_))
        ));
        assert_eq!(recognizer.recognize("x").await, Recognition::none());
    }

    #[tokio::test]
    async fn test_empty_reply_is_none() {
        let provider = MockProvider {
            reply: Ok(None),
            prompts: Mutex::new(Vec::new()),
        };
        let recognizer = RemoteRecognizer::new(Box::new(provider));
        assert!(matches!(
            recognizer.try_recognize("x").await,
            Err(RecognitionError::EmptyResponse)
        ));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
