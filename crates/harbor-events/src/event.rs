//! Push-event types broadcast over [`crate::EventBus`] and forwarded to the
//! browser extension by `harbor-transport`'s outbound side.

use chrono::{DateTime, Utc};
use harbor_core::SessionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata common to every published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique id for this specific event instance.
    pub id: Uuid,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// Name of the subsystem that published it (e.g. `"mcp"`, `"runtime"`).
    pub source: String,
}

impl EventMetadata {
    /// Stamp a new metadata record attributed to `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

/// A single step of the Chat Orchestrator's agent loop (§4.5), emitted in
/// `thought -> tool_calls -> tool_results -> (next iteration | final |
/// error)` order for a given session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrchestrationStep {
    /// The model's raw text response for this iteration.
    Thought {
        /// Text content, possibly empty if the model only emitted tool calls.
        text: String,
    },
    /// Tool calls the orchestrator is about to dispatch.
    ToolCalls {
        /// `(server_id, tool_name)` pairs in dispatch order.
        calls: Vec<(String, String)>,
    },
    /// Results (or errors) for the tool calls dispatched this iteration.
    ToolResults {
        /// One result per call, `Err` carrying a wire error code string.
        results: Vec<Result<serde_json::Value, String>>,
    },
    /// The loop produced a final answer with no further tool calls.
    Final {
        /// The model's final text answer.
        text: String,
    },
    /// The loop terminated abnormally (iteration bound, cancellation, error).
    Error {
        /// Wire error code (§7).
        code: String,
        /// Human-readable detail.
        message: String,
    },
}

/// Events published on [`crate::EventBus`] for consumption by the Transport
/// layer and by internal observers (e.g. the restart-window reset timer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HarborEvent {
    /// A Chat Orchestrator step for a session (§4.5).
    OrchestrationStep {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session this step belongs to.
        session_id: SessionId,
        /// The step itself.
        step: OrchestrationStep,
    },
    /// An MCP server process exited unexpectedly.
    ServerCrashed {
        /// Event metadata.
        metadata: EventMetadata,
        /// The installed server's id.
        server_id: String,
        /// The process exit code, if one was observed.
        exit_code: Option<i32>,
        /// The restart attempt number this crash counts toward.
        attempt: u32,
        /// The configured attempt limit before quarantine.
        limit: u32,
    },
    /// An MCP server was quarantined after exceeding its restart attempt limit.
    ServerQuarantined {
        /// Event metadata.
        metadata: EventMetadata,
        /// The installed server's id.
        server_id: String,
    },
    /// An MCP server was successfully (re)started.
    ServerStarted {
        /// Event metadata.
        metadata: EventMetadata,
        /// The installed server's id.
        server_id: String,
    },
    /// Usage accounting for an LLM call (tokens, cost estimate).
    Usage {
        /// Event metadata.
        metadata: EventMetadata,
        /// The session this usage is attributed to.
        session_id: SessionId,
        /// Prompt tokens consumed.
        prompt_tokens: u32,
        /// Completion tokens produced.
        completion_tokens: u32,
    },
}

impl HarborEvent {
    /// A short, stable identifier for this event's variant, used in logging
    /// and in the `trace!`/`debug!` spans emitted by [`crate::EventBus`].
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrchestrationStep { .. } => "orchestration_step",
            Self::ServerCrashed { .. } => "server_crashed",
            Self::ServerQuarantined { .. } => "server_quarantined",
            Self::ServerStarted { .. } => "server_started",
            Self::Usage { .. } => "usage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_is_stable_per_variant() {
        let event = HarborEvent::ServerStarted {
            metadata: EventMetadata::new("mcp"),
            server_id: "gmail".to_string(),
        };
        assert_eq!(event.event_type(), "server_started");
    }

    #[test]
    fn serializes_with_tagged_envelope() {
        let event = HarborEvent::Usage {
            metadata: EventMetadata::new("llm"),
            session_id: SessionId::new(),
            prompt_tokens: 10,
            completion_tokens: 20,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "usage");
    }
}
