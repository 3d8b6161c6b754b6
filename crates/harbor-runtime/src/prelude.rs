//! Prelude module - commonly used types for convenient import.
//!
//! Use `use harbor_runtime::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust,no_run
//! use harbor_runtime::prelude::*;
//! use harbor_audit::AuditLog;
//! use harbor_core::Origin;
//! use harbor_events::EventBus;
//! use harbor_mcp::McpSupervisor;
//! use harbor_policy::{GrantStore, RateBudgets};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(llm: Arc<impl harbor_llm::LlmProvider>) -> RuntimeResult<()> {
//! let events = EventBus::new();
//! let mcp = Arc::new(McpSupervisor::new(events.clone()));
//! let grants = Arc::new(GrantStore::in_memory());
//! let budgets = Arc::new(RateBudgets::new(60, Duration::from_secs(60)));
//! let audit = Arc::new(AuditLog::in_memory());
//!
//! let orchestrator =
//!     ChatOrchestrator::new(llm, mcp, grants, budgets, audit, events, "You are Harbor.");
//! let mut session = ChatSession::new();
//! let origin = Origin::new("https://example.com").unwrap();
//! let cancellation = CancellationToken::new();
//! let _outcome = orchestrator
//!     .run_turn(&mut session, &origin, "Hello!", &cancellation)
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Errors
pub use crate::{RuntimeError, RuntimeResult};

// Orchestrator
pub use crate::{CancellationToken, ChatOrchestrator, RunOutcome};

// Sessions
pub use crate::{ChatSession, SessionConfig};
pub use crate::{SessionStore, SessionSummary};

// Context management
pub use crate::{ContextManager, ContextStats, SummarizationResult};

// Text-based tool-call parsing (§4.5.1)
pub use crate::{parse_tool_call, ParsedToolCall};
