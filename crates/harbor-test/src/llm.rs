//! A scripted [`LlmProvider`] fake for driving the Chat Orchestrator in
//! tests without a live provider.

use std::sync::Mutex;

use async_trait::async_trait;
use harbor_llm::{
    LlmProvider, LlmResponse, LlmResult, LlmToolDefinition, Message, StopReason, StreamBox, Usage,
};

/// Replies with a fixed queue of assistant texts, one per `complete()`
/// call, falling back to an empty string once exhausted. Each text is
/// typically either a plain final answer or a fenced JSON tool call
/// (§4.5.1) the orchestrator's parser will pick up.
///
/// `stream()` is unimplemented — the orchestrator drives every turn
/// through `complete()`.
pub struct ScriptedLlmProvider {
    responses: Mutex<Vec<String>>,
    name: String,
    model: String,
    max_context_length: usize,
}

impl ScriptedLlmProvider {
    /// Script a sequence of assistant replies, returned in order.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            name: "scripted".to_string(),
            model: "scripted-model".to_string(),
            max_context_length: 100_000,
        }
    }

    /// Override the context window reported by `max_context_length`.
    #[must_use]
    pub fn with_max_context_length(mut self, max_context_length: usize) -> Self {
        self.max_context_length = max_context_length;
        self
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        _messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<StreamBox> {
        unimplemented!("ScriptedLlmProvider only drives complete()")
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<LlmResponse> {
        let mut responses = self.responses.lock().expect("scripted responses lock poisoned");
        let text = if responses.is_empty() {
            String::new()
        } else {
            responses.remove(0)
        };
        Ok(LlmResponse {
            message: Message::assistant(text),
            has_tool_calls: false,
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }

    fn max_context_length(&self) -> usize {
        self.max_context_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_script_order_then_empty() {
        let provider = ScriptedLlmProvider::new(["first", "second"]);
        let first = provider.complete(&[], &[], "").await.unwrap();
        let second = provider.complete(&[], &[], "").await.unwrap();
        let third = provider.complete(&[], &[], "").await.unwrap();

        assert_eq!(first.message.text(), Some("first"));
        assert_eq!(second.message.text(), Some("second"));
        assert_eq!(third.message.text(), Some(""));
    }
}
