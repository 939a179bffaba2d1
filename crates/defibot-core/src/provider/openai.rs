//! OpenAI-compatible LLM provider.
//!
//! Covers every provider exposing a `/chat/completions` endpoint:
//!
//! - OpenAI (`https://api.openai.com/v1`)
//! - OpenRouter (`https://openrouter.ai/api/v1`)
//! - DeepSeek (`https://api.deepseek.com/v1`)
//! - Groq (`https://api.groq.com/openai/v1`)
//! - Gemini (`https://generativelanguage.googleapis.com/v1beta/openai`)
//! - vLLM / any local server via a custom `apiBase`

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{ChatMessage, LlmResponse, Usage};
use super::LlmProvider;

/// Known provider base URLs.
const PROVIDER_URLS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    (
        "gemini",
        "https://generativelanguage.googleapis.com/v1beta/openai",
    ),
];

/// Maximum number of attempts for transient errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 500;

/// Provider for any endpoint speaking the OpenAI chat completions API.
///
/// Network failures and 429/5xx responses are retried with exponential
/// backoff; everything else fails on the first attempt.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    /// Create a new provider.
    ///
    /// `api_base` overrides the URL looked up from `provider_name`.
    pub fn new(
        provider_name: &str,
        api_key: &str,
        api_base: Option<&str>,
        default_model: &str,
        client: Client,
    ) -> Self {
        let base_url = api_base
            .map(|s| s.to_string())
            .unwrap_or_else(|| Self::known_base_url(provider_name).to_string())
            .trim_end_matches('/')
            .to_string();

        debug!(provider = provider_name, base_url = %base_url, "Initialized LLM provider");

        Self {
            client,
            api_key: api_key.to_string(),
            base_url,
            default_model: default_model.to_string(),
        }
    }

    fn known_base_url(provider_name: &str) -> &'static str {
        PROVIDER_URLS
            .iter()
            .find(|(name, _)| *name == provider_name)
            .map(|(_, url)| *url)
            .unwrap_or("https://api.openai.com/v1")
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
    }
}

// ── OpenAI API request/response types ───────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageResponse>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageResponse,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageResponse {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_completion(body: &str) -> Result<LlmResponse> {
    let completion: CompletionResponse =
        serde_json::from_str(body).context("Failed to parse LLM API response")?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .context("LLM API returned no choices")?;

    let usage = completion.usage.map_or(Usage::default(), |u| Usage {
        prompt_tokens: u.prompt_tokens.unwrap_or(0),
        completion_tokens: u.completion_tokens.unwrap_or(0),
        total_tokens: u.total_tokens.unwrap_or(0),
    });

    Ok(LlmResponse {
        content: choice.message.content,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".into()),
        usage,
    })
}

// ── LlmProvider implementation ──────────────────────────────────────

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse> {
        let model = model.unwrap_or(&self.default_model);
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = CompletionRequest {
            model,
            messages,
            max_tokens,
            temperature,
        };

        debug!(model, url = %url, msg_count = messages.len(), "Sending chat completion request");

        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                warn!(attempt, delay_ms = delay, "Retrying LLM API request");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, error = %e, "Network error calling LLM API");
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read LLM API response body")?;

            if !status.is_success() {
                let err_msg = serde_json::from_str::<ErrorBody>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| body.clone());

                if Self::is_retryable_status(status) {
                    warn!(attempt, status = %status, "Transient LLM API error, will retry");
                    last_error = Some(anyhow::anyhow!("LLM API error ({}): {}", status, err_msg));
                    continue;
                }

                anyhow::bail!("LLM API error ({}): {}", status, err_msg);
            }

            let response = parse_completion(&body)?;
            debug!(
                finish_reason = %response.finish_reason,
                tokens = response.usage.total_tokens,
                "Received LLM response"
            );
            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("LLM API request failed after {} attempts", MAX_RETRIES)
        }))
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_url_lookup() {
        let client = Client::new();
        let p = OpenAiProvider::new("openrouter", "test-key", None, "m", client.clone());
        assert_eq!(p.base_url, "https://openrouter.ai/api/v1");

        let p = OpenAiProvider::new("unknown", "test-key", None, "m", client);
        assert_eq!(p.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_custom_base_url_trims_slash() {
        let p = OpenAiProvider::new(
            "vllm",
            "dummy",
            Some("http://localhost:8000/v1/"),
            "llama-3",
            Client::new(),
        );
        assert_eq!(p.base_url, "http://localhost:8000/v1");
        assert_eq!(p.default_model(), "llama-3");
    }

    #[test]
    fn test_retryable_status() {
        assert!(OpenAiProvider::is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(OpenAiProvider::is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!OpenAiProvider::is_retryable_status(reqwest::StatusCode::BAD_REQUEST));
        assert!(!OpenAiProvider::is_retryable_status(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "choices": [{"message": {"content": "{\"intent\": null}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let r = parse_completion(body).unwrap();
        assert_eq!(r.content.as_deref(), Some("{\"intent\": null}"));
        assert_eq!(r.usage.total_tokens, 15);

        assert!(parse_completion(r#"{"choices": []}"#).is_err());
    }
}
