#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the Harbor Agent Runtime Bridge.
//!
//! A single `harbor.toml` file, resolved under `$HARBOR_HOME` (falling
//! back to `$HOME/.harbor`, the same precedence `HARBOR_MCP_ISOLATION`
//! uses), holds the knobs ambient across the bridge: the Chat
//! Orchestrator's default iteration bound, the default rate-budget
//! window and limit, the MCP restart policy, the stderr ring-buffer
//! size, and per-provider base-URL overrides (§6).
//!
//! The file loads once at startup. [`ReloadableConfig::spawn_watch`]
//! additionally drives a `SIGHUP`- and filesystem-watch-triggered
//! reload: a malformed reload is logged and ignored rather than
//! crashing the process.
//!
//! # Usage
//!
//! ```rust,no_run
//! use harbor_config::HarborConfig;
//!
//! let config = HarborConfig::load().unwrap();
//! println!("iteration bound: {}", config.runtime.default_iteration_bound);
//! ```

/// Configuration error types.
pub mod error;
/// `harbor.toml` discovery and loading.
pub mod loader;
/// Prelude module for convenient imports.
pub mod prelude;
/// Configuration struct definitions.
pub mod types;
/// Post-parse configuration validation.
pub mod validate;
/// Validated hot-reload driven by `SIGHUP` and filesystem watch.
pub mod watch;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    HarborConfig, ProviderOverride, RateBudgetSection, RestartSection, RuntimeSection,
    StderrRingBufferSection,
};
pub use watch::ReloadableConfig;

impl HarborConfig {
    /// Load `harbor.toml`, resolving the home directory via
    /// `$HARBOR_HOME` (falling back to `$HOME/.harbor`).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the home directory cannot be
    /// resolved, the file exists but is malformed, or validation fails.
    pub fn load() -> ConfigResult<Self> {
        loader::load()
    }

    /// Load `harbor.toml` from an explicit home directory, bypassing
    /// `$HARBOR_HOME` resolution.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file exists but is malformed, or
    /// validation fails.
    pub fn load_with_home(home_dir: &std::path::Path) -> ConfigResult<Self> {
        loader::load_with_home(home_dir)
    }
}
