//! Harbor Host Facade — the per-origin RPC surface binding Policy × MCP
//! × LLM (§4.6).
//!
//! The facade is the only thing a Transport frame ever talks to: every
//! `listTools`/`callTool`/permission/session/LLM operation lands here,
//! gets checked against the Policy Kernel, dispatched to the MCP
//! Supervisor or Chat Orchestrator, and audited before the result goes
//! back over the wire.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use harbor_audit::AuditLog;
//! use harbor_core::Origin;
//! use harbor_events::EventBus;
//! use harbor_host::{HostFacade, ProviderRegistry};
//! use harbor_mcp::McpSupervisor;
//! use harbor_policy::{GrantStore, RateBudgets};
//! use harbor_runtime::SessionStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let events = EventBus::new();
//! let providers = Arc::new(ProviderRegistry::new());
//! providers.detect();
//!
//! let facade = HostFacade::new(
//!     Arc::new(GrantStore::in_memory()),
//!     Arc::new(RateBudgets::new(60, std::time::Duration::from_secs(60))),
//!     Arc::new(McpSupervisor::new(events.clone())),
//!     Arc::new(AuditLog::in_memory()),
//!     events,
//!     providers,
//!     SessionStore::new(std::env::temp_dir().join("harbor-sessions")),
//!     "You are Harbor.",
//! );
//!
//! let origin = Origin::new("https://example.com")?;
//! facade.grant(&origin, harbor_policy::Grant::always(origin.clone(), harbor_core::Scope::McpToolsList))?;
//! let _tools = facade.list_tools(&origin, None).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod dispatch;
mod error;
mod facade;
mod providers;

pub use dispatch::dispatch;
pub use error::{HostError, HostResult};
pub use facade::HostFacade;
pub use providers::{ProviderDescriptor, ProviderRegistry};
