//! Context window management: summarize the oldest messages of a
//! session when the conversation approaches the model's context limit.
//!
//! Uses an `auto_summarize`/`keep_recent_count` pair of knobs, operating on
//! [`crate::ChatSession`] directly rather than as runtime fields, since
//! the orchestrator here is a thinner, per-turn driver rather than a
//! long-lived object holding workspace/sub-agent state.

use harbor_llm::{LlmProvider, Message};

use crate::error::{RuntimeError, RuntimeResult};

/// Default maximum context tokens before summarization kicks in.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 100_000;
/// Default number of most recent messages kept verbatim when summarizing.
pub const DEFAULT_KEEP_RECENT_COUNT: usize = 10;

/// Snapshot of a session's context usage.
#[derive(Debug, Clone, Copy)]
pub struct ContextStats {
    /// Number of messages currently in the session.
    pub total_messages: usize,
    /// Estimated token count across all messages.
    pub estimated_tokens: usize,
    /// The configured ceiling before summarization triggers.
    pub max_context_tokens: usize,
}

impl ContextStats {
    /// Whether usage has crossed the configured ceiling.
    #[must_use]
    pub fn over_limit(&self) -> bool {
        self.estimated_tokens > self.max_context_tokens
    }
}

/// Outcome of a summarization pass.
#[derive(Debug, Clone)]
pub struct SummarizationResult {
    /// Number of messages evicted and replaced by the summary.
    pub evicted_count: usize,
    /// Approximate tokens freed by the eviction.
    pub tokens_freed: usize,
    /// The summary text, inserted as a single system message in place
    /// of the evicted range.
    pub summary_text: String,
}

/// Decides when a session needs summarizing and performs it via the
/// active LLM provider.
#[derive(Debug, Clone)]
pub struct ContextManager {
    max_context_tokens: usize,
    keep_recent_count: usize,
}

impl ContextManager {
    /// Build a manager with the given limits.
    #[must_use]
    pub fn new(max_context_tokens: usize, keep_recent_count: usize) -> Self {
        Self {
            max_context_tokens,
            keep_recent_count,
        }
    }

    /// Estimate context usage for `messages` via the provider's token
    /// counter.
    #[must_use]
    pub fn stats(&self, messages: &[Message], llm: &dyn LlmProvider) -> ContextStats {
        let estimated_tokens = messages
            .iter()
            .map(|m| llm.count_tokens(&message_text(m)))
            .sum();
        ContextStats {
            total_messages: messages.len(),
            estimated_tokens,
            max_context_tokens: self.max_context_tokens,
        }
    }

    /// Whether `messages` should be summarized before the next LLM call.
    #[must_use]
    pub fn needs_summarization(&self, messages: &[Message], llm: &dyn LlmProvider) -> bool {
        self.stats(messages, llm).over_limit() && messages.len() > self.keep_recent_count
    }

    /// Summarize the oldest messages of `messages`, keeping the most
    /// recent `keep_recent_count` verbatim, and return the replacement
    /// plan. Does not mutate `messages` itself — the caller (the
    /// orchestrator) applies the result so it can also emit the audit
    /// entry and event in the same step.
    ///
    /// # Errors
    ///
    /// Returns an error if the summarization completion fails.
    pub async fn summarize(
        &self,
        messages: &[Message],
        llm: &dyn LlmProvider,
    ) -> RuntimeResult<SummarizationResult> {
        if messages.len() <= self.keep_recent_count {
            return Err(RuntimeError::ContextOverflow {
                current: messages.len(),
                max: self.keep_recent_count,
            });
        }

        let split = messages.len() - self.keep_recent_count;
        let (to_evict, _recent) = messages.split_at(split);

        let transcript: String = to_evict
            .iter()
            .map(|m| format!("{:?}: {}\n", m.role, message_text(m)))
            .collect();

        let tokens_freed = llm.count_tokens(&transcript);

        let prompt = format!(
            "Summarize the following conversation history concisely, preserving \
             any facts, decisions, and open tasks a continuation would need:\n\n{transcript}"
        );
        let summary_text = llm.complete_simple(&prompt).await?;

        Ok(SummarizationResult {
            evicted_count: to_evict.len(),
            tokens_freed,
            summary_text,
        })
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_TOKENS, DEFAULT_KEEP_RECENT_COUNT)
    }
}

fn message_text(message: &Message) -> String {
    message.text().map(str::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harbor_llm::{LlmResponse, LlmToolDefinition, StopReason, StreamBox, Usage};

    struct FakeProvider;

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            _system: &str,
        ) -> harbor_llm::LlmResult<StreamBox> {
            unimplemented!("not used in these tests")
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            _system: &str,
        ) -> harbor_llm::LlmResult<LlmResponse> {
            Ok(LlmResponse {
                message: Message::assistant("a summary"),
                has_tool_calls: false,
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn max_context_length(&self) -> usize {
            DEFAULT_MAX_CONTEXT_TOKENS
        }
    }

    #[test]
    fn stats_counts_messages_and_tokens() {
        let manager = ContextManager::default();
        let messages = vec![Message::user("hello"), Message::assistant("hi there")];
        let stats = manager.stats(&messages, &FakeProvider);
        assert_eq!(stats.total_messages, 2);
        assert!(stats.estimated_tokens > 0);
    }

    #[test]
    fn needs_summarization_false_under_limit() {
        let manager = ContextManager::new(1_000_000, 10);
        let messages = vec![Message::user("hello")];
        assert!(!manager.needs_summarization(&messages, &FakeProvider));
    }

    #[tokio::test]
    async fn summarize_keeps_recent_tail() {
        let manager = ContextManager::new(0, 2);
        let messages: Vec<Message> = (0..5).map(|i| Message::user(format!("msg {i}"))).collect();

        let result = manager.summarize(&messages, &FakeProvider).await.unwrap();
        assert_eq!(result.evicted_count, 3);
        assert_eq!(result.summary_text, "a summary");
    }

    #[tokio::test]
    async fn summarize_rejects_when_nothing_to_evict() {
        let manager = ContextManager::new(0, 10);
        let messages = vec![Message::user("only one")];
        assert!(manager.summarize(&messages, &FakeProvider).await.is_err());
    }
}
