//! The shared error-code taxonomy every subsystem maps its errors onto.
//!
//! Each subsystem crate (`harbor-policy`, `harbor-mcp`, `harbor-llm`, ...)
//! defines its own `thiserror` error enum and implements
//! `fn code(&self) -> ErrorCode` for it. The Host Facade's wire conversion
//! matches exhaustively over each subsystem's error enum and never over
//! [`ErrorCode`] itself, so a missing mapping is a compile error rather than
//! a silently-swallowed wildcard arm.

use serde::{Deserialize, Serialize};

/// The twelve wire-level error codes Harbor exposes to the browser extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or violated a structural precondition.
    InvalidRequest,
    /// The referenced resource (session, server, tool, grant) does not exist.
    NotFound,
    /// The requested MCP server has no live connection.
    NotConnected,
    /// The origin lacks a permission grant for the required scope.
    PermissionDenied,
    /// The operation requires a scope that was not supplied or resolvable.
    ScopeRequired,
    /// The tool is excluded by an allowlist or policy restriction.
    ToolNotAllowed,
    /// The caller exceeded its sliding-window rate budget.
    RateLimited,
    /// An MCP tool call ran but returned an error result.
    ToolFailed,
    /// The LLM provider returned an error or could not be reached.
    LlmError,
    /// The operation exceeded its timeout and was cancelled.
    Timeout,
    /// The operation was cancelled by caller request.
    Cancelled,
    /// An unclassified internal failure; always logged with detail.
    Internal,
}

impl ErrorCode {
    /// The wire string for this code, matching [`ErrorCode`]'s `snake_case`
    /// serde representation (exposed for error messages and logging where a
    /// `&'static str` is more convenient than a serialized value).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::NotConnected => "not_connected",
            Self::PermissionDenied => "permission_denied",
            Self::ScopeRequired => "scope_required",
            Self::ToolNotAllowed => "tool_not_allowed",
            Self::RateLimited => "rate_limited",
            Self::ToolFailed => "tool_failed",
            Self::LlmError => "llm_error",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_matches_serde_rename() {
        let json = serde_json::to_string(&ErrorCode::ScopeRequired).unwrap();
        assert_eq!(json, "\"scope_required\"");
        assert_eq!(ErrorCode::ScopeRequired.as_str(), "scope_required");
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(ErrorCode::RateLimited.to_string(), "rate_limited");
    }

    #[test]
    fn round_trips_through_json() {
        for code in [
            ErrorCode::InvalidRequest,
            ErrorCode::NotFound,
            ErrorCode::NotConnected,
            ErrorCode::PermissionDenied,
            ErrorCode::ScopeRequired,
            ErrorCode::ToolNotAllowed,
            ErrorCode::RateLimited,
            ErrorCode::ToolFailed,
            ErrorCode::LlmError,
            ErrorCode::Timeout,
            ErrorCode::Cancelled,
            ErrorCode::Internal,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }
}
