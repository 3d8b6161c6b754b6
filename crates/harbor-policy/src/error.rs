//! Errors raised by the Policy Kernel.

use harbor_core::ErrorCode;
use thiserror::Error;

/// Result type returned by this crate's public API.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised by the Policy Kernel (§4.2).
///
/// Every variant maps onto one of the wire codes in `harbor_core::ErrorCode`
/// via [`PolicyError::code`]; the match is exhaustive over this enum, so a
/// new variant that forgets to pick a wire code is a compile error rather
/// than a silently-missing mapping.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No grant exists for the requested scope, or the matching grant is an
    /// explicit deny.
    #[error("no grant for origin {origin} scope {scope}")]
    PermissionDenied {
        /// Origin that was checked.
        origin: String,
        /// Scope that was checked.
        scope: String,
    },
    /// A grant exists but does not cover the scope being checked; the UI
    /// should prompt the user for consent.
    #[error("origin {origin} lacks scope {scope}")]
    ScopeRequired {
        /// Origin that was checked.
        origin: String,
        /// Scope the caller needs to request.
        scope: String,
    },
    /// A grant exists for `mcp:tools.call` but the tool is excluded by the
    /// grant's allowlist or the server's own restriction.
    #[error("tool {tool} not allowed for origin {origin}")]
    ToolNotAllowed {
        /// Origin that attempted the call.
        origin: String,
        /// Tool name that was rejected.
        tool: String,
    },
    /// The sliding-window rate budget for (origin, resource) is exhausted.
    #[error("rate budget exhausted for origin {origin} resource {resource}")]
    RateLimited {
        /// Origin whose budget is exhausted.
        origin: String,
        /// Resource (tool name or scope) the budget is keyed on.
        resource: String,
    },
    /// The request itself is malformed (empty origin, unknown scope string).
    #[error("invalid policy request: {0}")]
    InvalidRequest(String),
    /// The grant or budget referenced by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The grant store's lock was poisoned or persistence failed.
    #[error("internal policy error: {0}")]
    Internal(String),
}

impl PolicyError {
    /// The wire error code this variant converts to (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::ScopeRequired { .. } => ErrorCode::ScopeRequired,
            Self::ToolNotAllowed { .. } => ErrorCode::ToolNotAllowed,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_a_wire_code() {
        let cases: Vec<(PolicyError, ErrorCode)> = vec![
            (
                PolicyError::PermissionDenied {
                    origin: "https://x.test".into(),
                    scope: "mcp:tools.call".into(),
                },
                ErrorCode::PermissionDenied,
            ),
            (
                PolicyError::ScopeRequired {
                    origin: "https://x.test".into(),
                    scope: "mcp:tools.list".into(),
                },
                ErrorCode::ScopeRequired,
            ),
            (
                PolicyError::ToolNotAllowed {
                    origin: "https://x.test".into(),
                    tool: "read_file".into(),
                },
                ErrorCode::ToolNotAllowed,
            ),
            (
                PolicyError::RateLimited {
                    origin: "https://x.test".into(),
                    resource: "read_file".into(),
                },
                ErrorCode::RateLimited,
            ),
            (
                PolicyError::InvalidRequest("empty origin".into()),
                ErrorCode::InvalidRequest,
            ),
            (PolicyError::NotFound("grant:1".into()), ErrorCode::NotFound),
            (
                PolicyError::Internal("lock poisoned".into()),
                ErrorCode::Internal,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.code(), expected);
        }
    }
}
