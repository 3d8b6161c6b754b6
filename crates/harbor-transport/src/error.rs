//! Transport-layer errors.

use thiserror::Error;

use harbor_core::ErrorCode;

/// Errors raised by the native-messaging frame codec.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The declared frame length exceeded [`crate::codec::MAX_FRAME_LEN`].
    #[error("frame length {len} exceeds maximum {max}")]
    FrameTooLarge {
        /// The declared length, in bytes.
        len: u32,
        /// The configured maximum.
        max: u32,
    },

    /// The frame payload was not valid UTF-8 JSON.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// The underlying stdio stream errored.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream closed cleanly (EOF) while a caller expected another frame.
    #[error("stream closed")]
    StreamClosed,
}

impl TransportError {
    /// The wire error code this error maps onto (§7).
    ///
    /// `StreamClosed` has no code of its own — the Transport layer treats it
    /// as graceful shutdown rather than surfacing an error frame.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FrameTooLarge { .. } | Self::MalformedFrame(_) => ErrorCode::InvalidRequest,
            Self::Io(_) | Self::StreamClosed => ErrorCode::Internal,
        }
    }
}
