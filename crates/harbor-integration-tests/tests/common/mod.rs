//! Shared fixtures for the §8 end-to-end scenario tests.

use std::sync::Arc;

use chrono::Duration;
use harbor_audit::AuditLog;
use harbor_events::EventBus;
use harbor_host::{HostFacade, ProviderRegistry};
use harbor_mcp::McpSupervisor;
use harbor_policy::{GrantStore, RateBudgets};
use harbor_runtime::SessionStore;

/// A default rate budget generous enough that no scenario trips it
/// unintentionally; scenarios that exercise the budget itself build
/// their own [`RateBudgets`] directly.
pub fn generous_budgets() -> Arc<RateBudgets> {
    Arc::new(RateBudgets::new(1_000, Duration::seconds(3600)))
}

/// A [`HostFacade`] over the given MCP Supervisor, with no LLM provider
/// configured — for the dispatch-layer scenarios (ping, permission gate)
/// that never reach an LLM.
///
/// Returns the sessions-directory [`tempfile::TempDir`] guard alongside
/// the facade; the caller must keep it alive for the facade's lifetime.
pub fn facade_over(mcp: Arc<McpSupervisor>) -> (HostFacade, tempfile::TempDir) {
    let sessions_dir = tempfile::tempdir().expect("create temp sessions dir");

    let facade = HostFacade::new(
        Arc::new(GrantStore::in_memory()),
        generous_budgets(),
        mcp,
        Arc::new(AuditLog::in_memory()),
        EventBus::new(),
        Arc::new(ProviderRegistry::new()),
        SessionStore::new(sessions_dir.path()),
        "You are Harbor.",
    );
    (facade, sessions_dir)
}

/// A fully in-memory [`HostFacade`] — no servers installed — for
/// scenarios that don't need to seed any MCP state.
pub fn bare_facade() -> (HostFacade, tempfile::TempDir) {
    facade_over(Arc::new(McpSupervisor::new(EventBus::new())))
}
