//! Stream-level native-messaging transport: reads [`InboundFrame`]s and
//! writes [`OutboundFrame`]s over any `AsyncRead`/`AsyncWrite` pair, usually
//! process stdin/stdout (§4.1).

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::warn;

use crate::codec::NativeMessagingCodec;
use crate::error::TransportError;
use crate::frame::{InboundFrame, OutboundFrame};

/// Reads [`InboundFrame`]s from an async byte stream.
///
/// A single malformed frame (invalid JSON, or a declared length that does
/// not match any known message shape) is logged and skipped rather than
/// tearing down the whole connection — only an I/O error or clean EOF ends
/// the stream (§4.1 guarantee: MUST NOT drop the connection on one bad
/// frame).
pub struct InboundReader<R> {
    inner: FramedRead<R, NativeMessagingCodec>,
}

impl<R: AsyncRead + Unpin> InboundReader<R> {
    /// Wrap a reader (typically `tokio::io::stdin()`).
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, NativeMessagingCodec),
        }
    }

    /// Read the next well-formed frame, skipping and logging malformed ones.
    ///
    /// Returns `Ok(None)` on clean stream close.
    pub async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError> {
        loop {
            let Some(raw) = self.inner.next().await else {
                return Ok(None);
            };

            let bytes = match raw {
                Ok(bytes) => bytes,
                Err(TransportError::FrameTooLarge { len, max }) => {
                    warn!(len, max, "discarding frame exceeding maximum length");
                    continue;
                },
                Err(err @ (TransportError::Io(_) | TransportError::StreamClosed)) => {
                    return Err(err);
                },
                Err(TransportError::MalformedFrame(_)) => unreachable!(
                    "NativeMessagingCodec::decode never produces MalformedFrame"
                ),
            };

            match serde_json::from_slice::<InboundFrame>(&bytes) {
                Ok(frame) => return Ok(Some(frame)),
                Err(err) => {
                    let prefix_len = bytes.len().min(64);
                    warn!(
                        error = %err,
                        len = bytes.len(),
                        hex_prefix = %hex::encode(&bytes[..prefix_len]),
                        "discarding malformed inbound frame"
                    );
                },
            }
        }
    }
}

/// Writes [`OutboundFrame`]s to an async byte stream.
pub struct OutboundWriter<W> {
    inner: FramedWrite<W, NativeMessagingCodec>,
}

impl<W: AsyncWrite + Unpin> OutboundWriter<W> {
    /// Wrap a writer (typically `tokio::io::stdout()`).
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(writer, NativeMessagingCodec),
        }
    }

    /// Serialize and write one frame.
    pub async fn send(&mut self, frame: &OutboundFrame) -> Result<(), TransportError> {
        let bytes = serde_json::to_vec(frame)?;
        self.inner.send(BytesMut::from(&bytes[..])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbound_writer_pong_crosses_the_wire_as_a_status_frame() {
        let (client, server) = tokio::io::duplex(4096);
        let mut writer = OutboundWriter::new(server);
        let mut raw_reader = FramedRead::new(client, NativeMessagingCodec);

        writer.send(&OutboundFrame::pong()).await.unwrap();

        let bytes = raw_reader.next().await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["payload"], "pong");
    }

    #[tokio::test]
    async fn inbound_reader_parses_a_ping_frame() {
        let (client, server) = tokio::io::duplex(4096);
        let mut raw_writer = FramedWrite::new(client, NativeMessagingCodec);
        let mut reader = InboundReader::new(server);

        let bytes = serde_json::to_vec(&InboundFrame::Ping).unwrap();
        raw_writer.send(BytesMut::from(&bytes[..])).await.unwrap();

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert!(matches!(frame, InboundFrame::Ping));
    }

    #[tokio::test]
    async fn inbound_reader_skips_malformed_frame_and_keeps_reading() {
        let (client, server) = tokio::io::duplex(4096);
        let mut raw_writer = FramedWrite::new(client, NativeMessagingCodec);
        let mut reader = InboundReader::new(server);

        raw_writer
            .send(BytesMut::from(&b"not json at all"[..]))
            .await
            .unwrap();
        raw_writer
            .send(BytesMut::from(&serde_json::to_vec(&InboundFrame::Ping).unwrap()[..]))
            .await
            .unwrap();

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert!(matches!(frame, InboundFrame::Ping));
    }

    #[tokio::test]
    async fn inbound_reader_returns_none_on_clean_close() {
        let (client, server) = tokio::io::duplex(4096);
        drop(client);
        let mut reader = InboundReader::new(server);
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
