#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Shared test doubles and fixtures for the Harbor workspace.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! harbor-test.workspace = true
//! ```
//!
//! ```rust
//! use harbor_test::{ScriptedLlmProvider, test_origin};
//!
//! let provider = ScriptedLlmProvider::new(["final answer"]);
//! let origin = test_origin();
//! ```

pub mod fixtures;
pub mod llm;
pub mod prelude;

pub use fixtures::{test_origin, test_origin_for, test_session_id};
pub use llm::ScriptedLlmProvider;
