//! Prelude module - commonly used types for convenient import.
//!
//! Use `use harbor_host::prelude::*;` to import all essential types.

// Errors
pub use crate::{HostError, HostResult};

// Facade
pub use crate::{dispatch, HostFacade};

// LLM provider registry
pub use crate::{ProviderDescriptor, ProviderRegistry};
