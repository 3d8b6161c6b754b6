//! Audit-related error types.

use harbor_core::ErrorCode;
use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The storage backend failed to read or write.
    #[error("storage error: {0}")]
    StorageError(String),

    /// An entry could not be (de)serialized.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The requested entry does not exist.
    #[error("audit entry not found: {entry_id}")]
    EntryNotFound {
        /// The entry id that was not found.
        entry_id: String,
    },

    /// A session's chain failed integrity verification.
    #[error("chain integrity violation at entry {entry_id}: {reason}")]
    IntegrityViolation {
        /// The entry where the violation was detected.
        entry_id: String,
        /// Why the chain is invalid.
        reason: String,
    },

    /// The requested session has no audit entries.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session id that was not found.
        session_id: String,
    },
}

impl AuditError {
    /// The wire error code this variant converts to (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::StorageError(_) | Self::SerializationError(_) => ErrorCode::Internal,
            Self::EntryNotFound { .. } | Self::SessionNotFound { .. } => ErrorCode::NotFound,
            Self::IntegrityViolation { .. } => ErrorCode::Internal,
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
