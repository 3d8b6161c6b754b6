//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_policy::prelude::*;
//! ```

pub use crate::{
    Grant, GrantId, GrantMode, GrantStore, PolicyError, PolicyOutcome, PolicyResult, RateBudgets,
    ONCE_GRANT_TTL_SECS,
};
