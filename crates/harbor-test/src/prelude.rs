//! Prelude module - commonly used types for convenient import.
//!
//! Use `use harbor_test::prelude::*;` to import all essential types.

pub use crate::{ScriptedLlmProvider, test_origin, test_origin_for, test_session_id};
