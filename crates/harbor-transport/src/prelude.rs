//! Prelude module - commonly used types for convenient import.
//!
//! ```rust
//! use harbor_transport::prelude::*;
//! ```

pub use crate::{InboundFrame, InboundReader, OutboundFrame, OutboundWriter, RpcError, TransportError};
