//! Z.AI provider.
//!
//! Z.AI (GLM models) speaks the `OpenAI` chat-completions wire format and
//! emits reasoning-delta events the same way DeepSeek and OpenAI's
//! o-series do, so it is implemented as a thin, differently-defaulted
//! wrapper around [`OpenAiCompatProvider`] rather than a new client.

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::openai_compat::OpenAiCompatProvider;
use crate::provider::{LlmProvider, StreamBox};
use crate::types::{LlmResponse, LlmToolDefinition, Message};

const DEFAULT_ZAI_URL: &str = "https://api.z.ai/api/paas/v4/chat/completions";
const DEFAULT_ZAI_MODEL: &str = "glm-4.6";

/// Z.AI LLM provider.
pub struct ZaiProvider {
    inner: OpenAiCompatProvider,
}

impl ZaiProvider {
    /// Create a new provider for the default Z.AI model (`glm-4.6`).
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self::with_model(api_key, DEFAULT_ZAI_MODEL)
    }

    /// Create a new provider for a specific Z.AI model.
    #[must_use]
    pub fn with_model(api_key: &str, model: &str) -> Self {
        let max_context = if model.contains("glm-4.6") { 200_000 } else { 128_000 };
        Self {
            inner: OpenAiCompatProvider::custom(DEFAULT_ZAI_URL, Some(api_key), model)
                .with_max_context(max_context),
        }
    }

    /// Set max tokens.
    #[must_use]
    pub fn with_max_tokens(self, max_tokens: usize) -> Self {
        Self {
            inner: self.inner.with_max_tokens(max_tokens),
        }
    }

    /// Set temperature.
    #[must_use]
    pub fn with_temperature(self, temperature: f64) -> Self {
        Self {
            inner: self.inner.with_temperature(temperature),
        }
    }
}

#[async_trait]
impl LlmProvider for ZaiProvider {
    fn name(&self) -> &str {
        "zai"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox> {
        self.inner.stream(messages, tools, system).await
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<LlmResponse> {
        self.inner.complete(messages, tools, system).await
    }

    fn max_context_length(&self) -> usize {
        self.inner.max_context_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_glm_4_6() {
        let provider = ZaiProvider::new("key");
        assert_eq!(provider.model(), "glm-4.6");
        assert_eq!(provider.name(), "zai");
    }

    #[test]
    fn custom_model_is_respected() {
        let provider = ZaiProvider::with_model("key", "glm-4-flash");
        assert_eq!(provider.model(), "glm-4-flash");
        assert_eq!(provider.max_context_length(), 128_000);
    }
}
