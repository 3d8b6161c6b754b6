//! Prelude module - commonly used types for convenient import.
//!
//! Use `use harbor_config::prelude::*;` to import all essential types.

// Errors
pub use crate::{ConfigError, ConfigResult};

// Config types
pub use crate::{
    HarborConfig, ProviderOverride, RateBudgetSection, RestartSection, RuntimeSection,
    StderrRingBufferSection,
};

// Hot-reload
pub use crate::ReloadableConfig;
