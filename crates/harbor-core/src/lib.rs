//! Harbor Core - foundation types shared by every crate in the Harbor agent
//! runtime bridge.
//!
//! This crate provides:
//! - [`HarborHome`](dirs::HarborHome), the on-disk root for catalog, session,
//!   secret, and config state
//! - [`ErrorCode`](error::ErrorCode), the twelve-code wire error taxonomy
//!   every subsystem's error type maps onto
//! - [`Origin`], [`Scope`], [`SessionId`], and [`Timestamp`], the data-model
//!   primitives referenced throughout the other `harbor-*` crates

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod dirs;
pub mod error;
pub mod prelude;
pub mod types;

pub use dirs::HarborHome;
pub use error::ErrorCode;
pub use types::{Origin, OriginError, Scope, SessionId, Timestamp};
