//! Unified prelude for Harbor, the browser-resident agent runtime
//! bridge.
//!
//! ```rust,ignore
//! use harbor_prelude::*;
//! // Now you have access to types from:
//! // - harbor-config (HarborConfig, ReloadableConfig)
//! // - harbor-core (Origin, Scope, SessionId, ErrorCode)
//! // - harbor-crypto (ContentHash)
//! // - harbor-events (EventBus, HarborEvent)
//! // - harbor-policy (GrantStore, RateBudgets)
//! // - harbor-mcp (McpSupervisor, ToolDefinition)
//! // - harbor-llm (providers, messages)
//! // - harbor-runtime (ChatOrchestrator, ChatSession)
//! // - harbor-audit (AuditLog, AuditAction)
//! // - harbor-telemetry (logging, request context)
//! // - harbor-transport (frame codec, InboundFrame/OutboundFrame)
//! // - harbor-host (HostFacade, ProviderRegistry)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use harbor_prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let events = EventBus::new();
//! let providers = Arc::new(ProviderRegistry::new());
//! providers.detect();
//!
//! let facade = HostFacade::new(
//!     Arc::new(GrantStore::in_memory()),
//!     Arc::new(RateBudgets::new(60, Duration::from_secs(60))),
//!     Arc::new(McpSupervisor::new(events.clone())),
//!     Arc::new(AuditLog::in_memory()),
//!     events,
//!     providers,
//!     SessionStore::new(std::env::temp_dir().join("harbor-sessions")),
//!     "You are Harbor.",
//! );
//!
//! let origin = Origin::new("https://example.com")?;
//! facade.grant(&origin, Grant::always(origin.clone(), Scope::McpToolsList))?;
//! let _tools = facade.list_tools(&origin, None).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Re-export every crate's prelude.
pub use harbor_audit::prelude::*;
pub use harbor_config::prelude::*;
pub use harbor_core::prelude::*;
pub use harbor_crypto::prelude::*;
pub use harbor_events::prelude::*;
pub use harbor_host::prelude::*;
pub use harbor_llm::prelude::*;
pub use harbor_mcp::prelude::*;
pub use harbor_policy::prelude::*;
pub use harbor_runtime::prelude::*;
pub use harbor_telemetry::prelude::*;
pub use harbor_transport::prelude::*;
