//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_core::prelude::*;
//! ```

pub use crate::{ErrorCode, HarborHome, Origin, OriginError, Scope, SessionId, Timestamp};
