//! Runtime error types.

use harbor_core::ErrorCode;
use thiserror::Error;

/// Errors that can occur in the Chat Orchestrator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Session not found.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session id.
        session_id: String,
    },

    /// LLM error.
    #[error("LLM error: {0}")]
    LlmError(#[from] harbor_llm::LlmError),

    /// MCP error.
    #[error("MCP error: {0}")]
    McpError(#[from] harbor_mcp::McpError),

    /// Audit error.
    #[error("audit error: {0}")]
    AuditError(#[from] harbor_audit::AuditError),

    /// Policy error (permission/budget denial during a tool call, §4.2).
    #[error("policy error: {0}")]
    PolicyError(#[from] harbor_policy::PolicyError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The session's context could not be summarized (nothing to evict).
    #[error("context overflow: {current} messages exceeds the {max}-message keep-recent window")]
    ContextOverflow {
        /// Current message count.
        current: usize,
        /// The keep-recent-count floor.
        max: usize,
    },

    /// The run was cancelled before completing.
    #[error("run cancelled")]
    Cancelled,

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RuntimeError {
    /// Map to the shared wire error taxonomy (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound { .. } => ErrorCode::NotFound,
            Self::LlmError(e) => e.code(),
            Self::McpError(e) => e.code(),
            Self::AuditError(e) => e.code(),
            Self::PolicyError(e) => e.code(),
            Self::SerializationError(_) => ErrorCode::Internal,
            Self::ContextOverflow { .. } => ErrorCode::Internal,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::IoError(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_maps_to_cancelled_code() {
        assert_eq!(RuntimeError::Cancelled.code(), ErrorCode::Cancelled);
    }

    #[test]
    fn session_not_found_maps_to_not_found() {
        let err = RuntimeError::SessionNotFound {
            session_id: "x".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
