//! Harbor Transport - the native-messaging wire format between the browser
//! extension and this process (§4.1, §6).
//!
//! Frames are a little-endian 32-bit length prefix followed by that many
//! bytes of UTF-8 JSON. [`InboundReader`] and [`OutboundWriter`] wrap any
//! `AsyncRead`/`AsyncWrite` pair (stdio in `--native-messaging` mode); a
//! malformed frame is logged and discarded rather than closing the
//! connection, and every frame boundary from the wire is preserved exactly
//! (no coalescing, no splitting).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod codec;
pub mod error;
pub mod frame;
pub mod prelude;
pub mod transport;

pub use codec::{MAX_FRAME_LEN, NativeMessagingCodec};
pub use error::TransportError;
pub use frame::{InboundFrame, OutboundFrame, RpcError};
pub use transport::{InboundReader, OutboundWriter};
