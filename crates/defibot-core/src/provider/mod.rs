//! LLM provider trait.
//!
//! The remote intent recognizer talks to a model through `LlmProvider`.
//! The `openai` module implements it for any OpenAI-compatible
//! chat completions endpoint (OpenAI, OpenRouter, DeepSeek, Groq, vLLM...).

pub mod openai;
pub mod types;

use async_trait::async_trait;
use types::{ChatMessage, LlmResponse};

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` - Conversation to complete
    /// * `model` - Model identifier override (None = use default)
    /// * `max_tokens` - Maximum response tokens
    /// * `temperature` - Sampling temperature
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> anyhow::Result<LlmResponse>;

    /// Get the default model identifier.
    fn default_model(&self) -> &str;
}
