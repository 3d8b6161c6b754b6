//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_mcp::prelude::*;
//! ```

pub use crate::{
    Connection, ConnectionCatalog, ConnectionKind, Isolation, McpError, McpResult, McpSupervisor,
    PackageKind, PromptContent, PromptDefinition, ResourceContent, ResourceDefinition,
    RestartPolicy, ServerConfig, ServersConfig, StderrRing, ToolDefinition, ToolResult,
};
