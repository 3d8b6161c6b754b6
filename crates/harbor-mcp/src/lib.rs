//! The MCP Supervisor (§4.3): hosts every Installed Server connection the
//! Agent Runtime Bridge talks to, in either direct or isolated mode, behind
//! one capability surface.
//!
//! # Architecture
//!
//! This crate wraps the official `rmcp` SDK with:
//! - Installed Server configuration, persisted as `servers.json`
//! - Process lifecycle management (spawn, crash recovery, quarantine)
//! - Binary hash verification before execution
//! - Tool/resource/prompt descriptor caching after `initialize`
//!
//! Sampling, roots, and elicitation (other MCP protocol extensions) are
//! out of scope here — Harbor has no requirement for them. Tool-call
//! authorization and rate budgets live in `harbor-policy`, invoked by the
//! Host Facade before it ever calls into this crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use harbor_events::EventBus;
//! use harbor_mcp::{McpSupervisor, ServerConfig};
//!
//! # async fn example() -> Result<(), harbor_mcp::McpError> {
//! let supervisor = Arc::new(McpSupervisor::new(EventBus::new()));
//! supervisor
//!     .add_server(
//!         ServerConfig::npm("filesystem", "npx")
//!             .with_args(["-y", "@anthropics/mcp-server-filesystem", "/tmp"])
//!             .auto_start(),
//!     )
//!     .await;
//!
//! supervisor.connect("filesystem").await?;
//!
//! let tools = supervisor.list_tools().await;
//! for tool in tools {
//!     println!("Tool: {}:{}", tool.server, tool.name);
//! }
//!
//! let result = supervisor
//!     .call_tool("filesystem", "read_file", serde_json::json!({"path": "/tmp/test.txt"}))
//!     .await?;
//! println!("Result: {}", result.text_content());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod config;
mod connection;
mod error;
mod supervisor;
mod types;

pub use config::{Isolation, PackageKind, RestartPolicy, ServerConfig, ServersConfig};
pub use connection::{Connection, ConnectionCatalog, ConnectionKind, StderrRing, STDERR_RING_CAPACITY};
pub use error::{McpError, McpResult};
pub use supervisor::{McpSupervisor, ISOLATION_ENV_VAR};
pub use types::{
    PromptArgument, PromptContent, PromptDefinition, PromptMessage, ResourceContent,
    ResourceDefinition, ServerCapabilities, ServerInfo, ToolContent, ToolDefinition, ToolResult,
};
