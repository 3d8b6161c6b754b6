//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_events::prelude::*;
//! ```

pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventMetadata, EventReceiver, HarborEvent, OrchestrationStep};
