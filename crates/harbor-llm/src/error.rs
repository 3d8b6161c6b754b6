//! LLM-related error types.

use harbor_core::ErrorCode;
use thiserror::Error;

/// Errors that can occur with LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key not configured.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Invalid response from API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Model not supported.
    #[error("Model not supported: {model}")]
    ModelNotSupported {
        /// Model name.
        model: String,
    },

    /// Context length exceeded.
    #[error("Context length exceeded: {current} tokens, max is {max}")]
    ContextLengthExceeded {
        /// Current token count.
        current: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Streaming error.
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// The wire error code this variant converts to (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ApiKeyNotConfigured { .. } => ErrorCode::InvalidRequest,
            Self::ApiRequestFailed(_) | Self::HttpError(_) => ErrorCode::LlmError,
            Self::RateLimitExceeded { .. } => ErrorCode::RateLimited,
            Self::InvalidResponse(_) => ErrorCode::LlmError,
            Self::ModelNotSupported { .. } | Self::ConfigError(_) => ErrorCode::InvalidRequest,
            Self::ContextLengthExceeded { .. } => ErrorCode::InvalidRequest,
            Self::StreamingError(_) => ErrorCode::LlmError,
            Self::SerializationError(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_a_wire_code() {
        assert_eq!(
            LlmError::ApiKeyNotConfigured {
                provider: "claude".into()
            }
            .code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            LlmError::RateLimitExceeded {
                retry_after_secs: 5
            }
            .code(),
            ErrorCode::RateLimited
        );
        assert_eq!(
            LlmError::ContextLengthExceeded {
                current: 10,
                max: 5
            }
            .code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            LlmError::ApiRequestFailed("boom".into()).code(),
            ErrorCode::LlmError
        );
    }
}
