//! Errors raised by the MCP Supervisor (§4.3).

use harbor_core::ErrorCode;
use thiserror::Error;

/// Result type returned by this crate's public API.
pub type McpResult<T> = Result<T, McpError>;

/// Errors raised while managing or talking to MCP servers.
#[derive(Debug, Error)]
pub enum McpError {
    /// No server is registered under this id.
    #[error("unknown server: {name}")]
    ServerNotFound {
        /// The unrecognized server id.
        name: String,
    },
    /// The server is registered but not currently connected.
    #[error("server not running: {name}")]
    ServerNotRunning {
        /// The server id.
        name: String,
    },
    /// The server has exceeded its restart attempt limit within the
    /// restart window and is quarantined pending explicit user action.
    #[error("server quarantined after {attempts} crashes: {name}")]
    ServerQuarantined {
        /// The server id.
        name: String,
        /// Number of crashes observed within the restart window.
        attempts: u32,
    },
    /// Spawning the server process (or its isolated runner) failed.
    #[error("failed to spawn server {name}: {reason}")]
    SpawnFailed {
        /// The server id.
        name: String,
        /// The underlying error.
        reason: String,
    },
    /// The configured binary hash did not match the on-disk executable.
    #[error("binary hash mismatch for {name}: expected {expected}, got {actual}")]
    BinaryHashMismatch {
        /// The server id.
        name: String,
        /// Hash recorded in configuration.
        expected: String,
        /// Hash actually computed from the executable.
        actual: String,
    },
    /// A `callTool`/`listTools`/`readResource`/`getPrompt` call failed.
    #[error("tool call failed: {server}:{tool}: {reason}")]
    ToolCallFailed {
        /// The server id.
        server: String,
        /// The tool name.
        tool: String,
        /// The underlying error.
        reason: String,
    },
    /// An MCP request exceeded its deadline.
    #[error("request to {server} timed out")]
    Timeout {
        /// The server id.
        server: String,
    },
    /// The configuration file was malformed.
    #[error("config error: {0}")]
    ConfigError(String),
    /// Serializing or deserializing a value failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An I/O error occurred talking to a server process.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other internal failure.
    #[error("internal mcp error: {0}")]
    Internal(String),
}

impl McpError {
    /// The wire error code this variant converts to (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ServerNotFound { .. } => ErrorCode::NotFound,
            Self::ServerNotRunning { .. } => ErrorCode::NotConnected,
            Self::ServerQuarantined { .. } => ErrorCode::ToolFailed,
            Self::SpawnFailed { .. } => ErrorCode::ToolFailed,
            Self::BinaryHashMismatch { .. } => ErrorCode::ToolFailed,
            Self::ToolCallFailed { .. } => ErrorCode::ToolFailed,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::ConfigError(_) => ErrorCode::InvalidRequest,
            Self::SerializationError(_) => ErrorCode::Internal,
            Self::Io(_) => ErrorCode::Internal,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_a_wire_code() {
        assert_eq!(
            McpError::ServerNotFound { name: "fs".into() }.code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            McpError::ServerNotRunning { name: "fs".into() }.code(),
            ErrorCode::NotConnected
        );
        assert_eq!(
            McpError::ServerQuarantined {
                name: "fs".into(),
                attempts: 3
            }
            .code(),
            ErrorCode::ToolFailed
        );
        assert_eq!(
            McpError::ToolCallFailed {
                server: "fs".into(),
                tool: "read".into(),
                reason: "boom".into()
            }
            .code(),
            ErrorCode::ToolFailed
        );
        assert_eq!(
            McpError::Timeout { server: "fs".into() }.code(),
            ErrorCode::Timeout
        );
        assert_eq!(
            McpError::ConfigError("bad toml".into()).code(),
            ErrorCode::InvalidRequest
        );
    }
}
