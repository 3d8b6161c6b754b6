//! Harbor Crypto - content hashing for the Harbor agent runtime bridge.
//!
//! This crate provides BLAKE3 content hashing used for:
//! - binary-hash verification before spawning an MCP server (§4.3)
//! - chain-linking audit entries (`harbor-audit`'s `previous_hash`)
//!
//! # Example
//!
//! ```
//! use harbor_crypto::ContentHash;
//!
//! let hash = ContentHash::hash(b"important data");
//! println!("Hash: {}", hash.to_hex());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
