//! Storage error types.

use harbor_core::ErrorCode;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key or item was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),

    /// Connection to the storage backend failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The namespace or key is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Map to the shared taxonomy used by host-facing RPC responses (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Internal(_) => ErrorCode::Internal,
            Self::Connection(_) => ErrorCode::Internal,
            Self::Serialization(_) => ErrorCode::Internal,
            Self::InvalidKey(_) => ErrorCode::InvalidRequest,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found_code() {
        assert_eq!(StorageError::NotFound("x".to_string()).code(), ErrorCode::NotFound);
    }

    #[test]
    fn invalid_key_maps_to_invalid_request() {
        assert_eq!(
            StorageError::InvalidKey("x".to_string()).code(),
            ErrorCode::InvalidRequest
        );
    }
}
