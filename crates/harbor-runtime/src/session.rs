//! Chat Session state (§3 Data Model).

use std::collections::HashSet;

use harbor_core::{SessionId, Timestamp};
use harbor_llm::Message;
use serde::{Deserialize, Serialize};

/// Default iteration bound for a chat run (§4.5 step 7).
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Per-session run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum orchestrator iterations for a single run.
    pub max_iterations: u32,
    /// Whether the tool router (keyword filter) is applied (§4.5 step 3).
    pub tool_router_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_router_enabled: false,
        }
    }
}

/// A Chat Session: ordered message log, enabled-server set, and
/// per-session overrides, owned by the Chat Orchestrator and persisted
/// between runs (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session id.
    pub id: SessionId,
    /// Ordered conversation log.
    pub messages: Vec<Message>,
    /// Server ids whose tools are offered to the model (§4.5 step 2).
    pub enabled_servers: HashSet<String>,
    /// Per-session system prompt override, appended to the base agent
    /// instructions when present.
    pub system_prompt_override: Option<String>,
    /// Run configuration.
    pub config: SessionConfig,
    /// When the session was created.
    pub created_at: Timestamp,
    /// When the session was last modified (message appended, config
    /// changed, summarized).
    pub updated_at: Timestamp,
}

impl ChatSession {
    /// Create a new, empty session.
    #[must_use]
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            enabled_servers: HashSet::new(),
            system_prompt_override: None,
            config: SessionConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a session with a specific id (e.g. restored from disk).
    #[must_use]
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            ..Self::new()
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Timestamp::now();
    }

    /// Enable a server's tools for this session.
    pub fn enable_server(&mut self, server_id: impl Into<String>) {
        self.enabled_servers.insert(server_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Disable a server's tools for this session.
    pub fn disable_server(&mut self, server_id: &str) {
        self.enabled_servers.remove(server_id);
        self.updated_at = Timestamp::now();
    }

    /// Remove every message (§4.6 chat session `clear` op), keeping
    /// session identity and configuration.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.updated_at = Timestamp::now();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_default_config() {
        let session = ChatSession::new();
        assert_eq!(session.config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn clear_messages_preserves_identity() {
        let mut session = ChatSession::new();
        session.push_message(Message::user("hi"));
        let id = session.id;

        session.clear_messages();

        assert_eq!(session.id, id);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn enable_and_disable_server() {
        let mut session = ChatSession::new();
        session.enable_server("gmail");
        assert!(session.enabled_servers.contains("gmail"));

        session.disable_server("gmail");
        assert!(!session.enabled_servers.contains("gmail"));
    }
}
