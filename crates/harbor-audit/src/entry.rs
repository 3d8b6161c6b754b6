//! Audit entry types and actions (§4.6, §7).
//!
//! Every Host Facade operation is recorded as an [`AuditEntry`]. Entries
//! are chain-linked — each carries the content hash of the previous entry
//! in its session — so tampering with history is detectable even though,
//! unlike the system this crate started from, entries are not
//! individually signed: Harbor's audit log is a local tamper-evidence
//! trail for the extension's own process, not a multi-party attestation.

use harbor_core::{Origin, Scope, SessionId, Timestamp};
use harbor_crypto::ContentHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Mint a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "audit:{}", &self.0.to_string()[..8])
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// When this entry was created.
    pub timestamp: Timestamp,
    /// Session this entry belongs to.
    pub session_id: SessionId,
    /// The action being audited.
    pub action: AuditAction,
    /// Authorization proof for this action.
    pub authorization: AuthorizationProof,
    /// Outcome of the action.
    pub outcome: AuditOutcome,
    /// Hash of the previous entry in this session's chain.
    pub previous_hash: ContentHash,
}

impl AuditEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        action: AuditAction,
        authorization: AuthorizationProof,
        outcome: AuditOutcome,
        previous_hash: ContentHash,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            timestamp: Timestamp::now(),
            session_id,
            action,
            authorization,
            outcome,
            previous_hash,
        }
    }

    /// Compute the content hash of this entry, used as `previous_hash`
    /// for the next entry in the same session's chain.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        ContentHash::hash(&bytes)
    }

    /// Whether this entry's `previous_hash` matches `previous`'s content
    /// hash (chain linking).
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.previous_hash == previous.content_hash()
    }
}

/// Actions that can be audited (§4.6: every facade operation records one).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    /// `listTools` was called.
    ListTools {
        /// Requesting origin.
        origin: String,
    },
    /// An MCP tool was called.
    McpToolCall {
        /// Server id.
        server: String,
        /// Tool name.
        tool: String,
        /// Hash of the arguments (not the args themselves, for privacy).
        args_hash: ContentHash,
        /// Correlates to the orchestrator run, if any.
        run_id: Option<String>,
    },
    /// An MCP resource was read.
    McpResourceRead {
        /// Server id.
        server: String,
        /// Resource URI.
        uri: String,
    },
    /// An MCP prompt was retrieved.
    McpPromptGet {
        /// Server id.
        server: String,
        /// Prompt name.
        name: String,
    },
    /// A permission grant/revoke/check op ran.
    PermissionOp {
        /// Origin the op applies to.
        origin: String,
        /// Scope involved.
        scope: Scope,
        /// What was done (`grant`, `revoke`, `check`, `expire_tab`).
        op: String,
    },
    /// A chat session op ran.
    ChatSessionOp {
        /// Session id.
        session_id: SessionId,
        /// What was done (`create`, `send`, `get`, `list`, `update`,
        /// `delete`, `clear`).
        op: String,
    },
    /// Context was summarized (messages evicted).
    ContextSummarized {
        /// Number of messages evicted.
        evicted_count: usize,
        /// Approximate tokens freed.
        tokens_freed: usize,
    },
    /// An LLM request was made.
    LlmRequest {
        /// Model used.
        model: String,
        /// Input token count.
        input_tokens: usize,
        /// Output token count.
        output_tokens: usize,
    },
    /// A server was started.
    ServerStarted {
        /// Server id.
        id: String,
        /// Transport kind.
        transport: String,
    },
    /// A server crashed.
    ServerCrashed {
        /// Server id.
        id: String,
        /// Exit code, if known.
        exit_code: Option<i32>,
        /// Restart count after this crash.
        restart_count: u32,
    },
    /// A server was quarantined after exceeding its restart limit.
    ServerQuarantined {
        /// Server id.
        id: String,
    },
    /// Configuration was reloaded.
    ConfigReloaded,
}

impl AuditAction {
    /// A human-readable one-line description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::ListTools { origin } => format!("Listed tools for {origin}"),
            Self::McpToolCall { server, tool, .. } => format!("Called tool {server}:{tool}"),
            Self::McpResourceRead { server, uri } => format!("Read resource {server}:{uri}"),
            Self::McpPromptGet { server, name } => format!("Got prompt {server}:{name}"),
            Self::PermissionOp { origin, op, .. } => format!("Permission {op} for {origin}"),
            Self::ChatSessionOp { session_id, op } => format!("Session {op}: {session_id}"),
            Self::ContextSummarized { evicted_count, .. } => {
                format!("Summarized {evicted_count} messages")
            },
            Self::LlmRequest { model, .. } => format!("LLM request to {model}"),
            Self::ServerStarted { id, .. } => format!("Started server {id}"),
            Self::ServerCrashed { id, .. } => format!("Server {id} crashed"),
            Self::ServerQuarantined { id } => format!("Server {id} quarantined"),
            Self::ConfigReloaded => "Configuration reloaded".to_string(),
        }
    }
}

/// How a facade operation was authorized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationProof {
    /// Authorized by a stored grant.
    Grant {
        /// Origin the grant applies to.
        origin: String,
        /// Scope the grant covers.
        scope: Scope,
    },
    /// No authorization required (e.g. a read-only status query).
    NotRequired {
        /// Reason no auth was needed.
        reason: String,
    },
    /// System-initiated action (not triggered by an origin-scoped call).
    System {
        /// Reason for the system action.
        reason: String,
    },
    /// Authorization was denied.
    Denied {
        /// Reason for denial.
        reason: String,
    },
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Action succeeded.
    Success {
        /// Optional details.
        details: Option<String>,
    },
    /// Action failed.
    Failure {
        /// Error message.
        error: String,
    },
}

impl AuditOutcome {
    /// A success outcome with no extra detail.
    #[must_use]
    pub fn success() -> Self {
        Self::Success { details: None }
    }

    /// A success outcome carrying detail text.
    #[must_use]
    pub fn success_with(details: impl Into<String>) -> Self {
        Self::Success {
            details: Some(details.into()),
        }
    }

    /// A failure outcome.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether this outcome represents success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
