//! Configuration types for the Harbor runtime.
//!
//! Every section implements [`Default`] with sensible production values so
//! that a bare `harbor.toml` — or a missing one — produces a working
//! configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the Harbor Agent Runtime Bridge, loaded from
/// `harbor.toml` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarborConfig {
    /// Chat Orchestrator tool-call iteration bound (§4.5).
    pub runtime: RuntimeSection,
    /// Default sliding-window rate budget applied to every (origin,
    /// resource) pair unless overridden (§4.2).
    pub rate_budget: RateBudgetSection,
    /// MCP server crash-recovery restart policy (§4.3).
    pub restart: RestartSection,
    /// In-memory stderr ring buffer retained per installed server.
    pub stderr_ring_buffer: StderrRingBufferSection,
    /// Per-provider base-URL overrides, keyed by provider id (e.g.
    /// `"claude"`, `"openai"`, `"zai"`).
    pub providers: HashMap<String, ProviderOverride>,
}

impl Default for HarborConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeSection::default(),
            rate_budget: RateBudgetSection::default(),
            restart: RestartSection::default(),
            stderr_ring_buffer: StderrRingBufferSection::default(),
            providers: HashMap::new(),
        }
    }
}

/// Chat Orchestrator behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Maximum number of tool-call iterations the Orchestrator will drive
    /// in a single turn before forcing a final answer (§4.5).
    pub default_iteration_bound: usize,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            default_iteration_bound: 10,
        }
    }
}

/// Default sliding-window rate budget (§4.2, `harbor_policy::RateBudgets`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateBudgetSection {
    /// Number of acquisitions allowed per window.
    pub limit: u32,
    /// Window length, in seconds.
    pub window_secs: u64,
}

impl RateBudgetSection {
    /// The configured window as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateBudgetSection {
    fn default() -> Self {
        Self {
            limit: 100,
            window_secs: 60,
        }
    }
}

/// MCP server crash-recovery restart policy (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartSection {
    /// Restart attempts allowed within `window_secs` before the server is
    /// quarantined.
    pub attempt_limit: u32,
    /// Sliding restart-counting window, in seconds.
    pub window_secs: u64,
}

impl RestartSection {
    /// The configured window as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RestartSection {
    fn default() -> Self {
        Self {
            attempt_limit: 3,
            window_secs: 300,
        }
    }
}

/// In-memory stderr capture retained per installed server, for inclusion
/// in crash/quarantine diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StderrRingBufferSection {
    /// Number of trailing lines retained.
    pub lines: usize,
}

impl Default for StderrRingBufferSection {
    fn default() -> Self {
        Self { lines: 200 }
    }
}

/// Base-URL override for one LLM provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOverride {
    /// Overrides the provider's built-in default endpoint.
    pub base_url: Option<String>,
}
