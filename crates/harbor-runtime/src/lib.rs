//! Chat Orchestrator: Chat Session state, context-window summarization,
//! and the bounded agent loop that drives tool-augmented conversations
//! (§4.5).
//!
//! # Architecture
//!
//! [`ChatOrchestrator`] coordinates:
//! - an `harbor_llm::LlmProvider` for language model completions
//! - an `harbor_mcp::McpSupervisor` for tool dispatch
//! - `harbor_policy`'s grant store and rate budgets for per-call authorization
//! - an `harbor_audit::AuditLog` for the append-only record of every tool call
//! - an `harbor_events::EventBus` for per-step orchestration events
//!
//! # Example
//!
//! ```rust,no_run
//! use harbor_runtime::{CancellationToken, ChatOrchestrator, ChatSession};
//! use harbor_audit::AuditLog;
//! use harbor_core::Origin;
//! use harbor_events::EventBus;
//! use harbor_mcp::McpSupervisor;
//! use harbor_policy::{GrantStore, RateBudgets};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(llm: Arc<impl harbor_llm::LlmProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let events = EventBus::new();
//! let mcp = Arc::new(McpSupervisor::new(events.clone()));
//! let grants = Arc::new(GrantStore::in_memory());
//! let budgets = Arc::new(RateBudgets::new(60, Duration::from_secs(60)));
//! let audit = Arc::new(AuditLog::in_memory());
//!
//! let orchestrator =
//!     ChatOrchestrator::new(llm, mcp, grants, budgets, audit, events, "You are Harbor.");
//!
//! let mut session = ChatSession::new();
//! let origin = Origin::new("https://example.com")?;
//! let cancellation = CancellationToken::new();
//! let outcome = orchestrator
//!     .run_turn(&mut session, &origin, "Hello!", &cancellation)
//!     .await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod orchestrator;
mod parser;
mod session;
mod store;

pub use context::{
    ContextManager, ContextStats, SummarizationResult, DEFAULT_KEEP_RECENT_COUNT,
    DEFAULT_MAX_CONTEXT_TOKENS,
};
pub use error::{RuntimeError, RuntimeResult};
pub use orchestrator::{CancellationToken, ChatOrchestrator, RunOutcome};
pub use parser::{parse_tool_call, tool_name_set, ParsedToolCall};
pub use session::{ChatSession, SessionConfig, DEFAULT_MAX_ITERATIONS};
pub use store::{SessionStore, SessionSummary};
