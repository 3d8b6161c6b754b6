//! Errors raised by the Host Facade (§4.6).

use harbor_core::ErrorCode;
use thiserror::Error;

/// Result type returned by this crate's public API.
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced across the per-origin facade, after classification
/// from the underlying Policy Kernel / MCP Supervisor / LLM Manager /
/// Chat Orchestrator errors (§7).
#[derive(Debug, Error)]
pub enum HostError {
    /// The inbound RPC was missing a required field or carried a value
    /// of the wrong shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The referenced session, provider, or grant does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The RPC method name has no handler.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Propagated from the Policy Kernel.
    #[error(transparent)]
    Policy(#[from] harbor_policy::PolicyError),

    /// Propagated from the MCP Supervisor.
    #[error(transparent)]
    Mcp(#[from] harbor_mcp::McpError),

    /// Propagated from the LLM Manager.
    #[error(transparent)]
    Llm(#[from] harbor_llm::LlmError),

    /// Propagated from the Chat Orchestrator.
    #[error(transparent)]
    Runtime(#[from] harbor_runtime::RuntimeError),

    /// Propagated from the audit ledger.
    #[error(transparent)]
    Audit(#[from] harbor_audit::AuditError),

    /// The caller's rate budget for this resource is exhausted.
    #[error("rate limited: {resource}")]
    RateLimited {
        /// The budgeted resource that was exhausted.
        resource: String,
    },

    /// An unclassified internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HostError {
    /// The wire error code this error maps onto (§7). Each subsystem's
    /// own `code()` is delegated to so a new variant there cannot be
    /// silently dropped to `internal` here.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownMethod(_) => ErrorCode::InvalidRequest,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Policy(e) => e.code(),
            Self::Mcp(e) => e.code(),
            Self::Llm(e) => e.code(),
            Self::Runtime(e) => e.code(),
            Self::Audit(e) => e.code(),
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_maps_to_invalid_request_code() {
        let err = HostError::InvalidRequest("missing field 'origin'".to_string());
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn unknown_method_maps_to_invalid_request_code() {
        let err = HostError::UnknownMethod("frobnicate".to_string());
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn rate_limited_maps_to_rate_limited_code() {
        let err = HostError::RateLimited { resource: "mcp:tools.call".to_string() };
        assert_eq!(err.code(), ErrorCode::RateLimited);
    }
}
