//! Harbor Policy - the authorization oracle between the Host Facade and
//! every other subsystem (§4.2).
//!
//! Every origin-gated operation goes through a [`GrantStore`]: `check`
//! resolves whether the caller holds a scope under the precedence rule
//! (explicit deny > tab-scoped always-allow > origin-wide always-allow >
//! once > absent), `check_tool` additionally intersects a grant's
//! tool-allowlist with the server's own, and [`RateBudgets`] enforces
//! sliding-window limits per (origin, resource). The kernel is the single
//! point where budgets are decremented; nothing downstream is meant to
//! bypass it.
//!
//! # Example
//!
//! ```
//! use harbor_policy::{Grant, GrantStore};
//! use harbor_core::{Origin, Scope};
//!
//! let store = GrantStore::in_memory();
//! let origin = Origin::new("https://x.test").unwrap();
//!
//! store.grant(Grant::once(origin.clone(), Scope::McpToolsList)).unwrap();
//! assert!(store.check(&origin, Scope::McpToolsList, None).is_ok());
//! // Consumed on first use.
//! assert!(store.check(&origin, Scope::McpToolsList, None).is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod budget;
mod error;
mod grant;
mod store;

pub use budget::RateBudgets;
pub use error::{PolicyError, PolicyResult};
pub use grant::{Grant, GrantId, GrantMode, ONCE_GRANT_TTL_SECS};
pub use store::{GrantStore, PolicyOutcome};
