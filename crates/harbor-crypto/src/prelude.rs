//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_crypto::prelude::*;
//! ```

pub use crate::{ContentHash, CryptoError, CryptoResult};
