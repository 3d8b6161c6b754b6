//! Byte-level length-delimited framing: a little-endian 32-bit length
//! prefix followed by that many bytes of UTF-8 JSON (§4.1, §6).
//!
//! Chrome's native-messaging host protocol prefixes each message with a
//! 32-bit length in the platform's native byte order, which in practice
//! means little-endian on every supported host platform.
//! `tokio_util::codec::LengthDelimitedCodec` only supports big-endian,
//! little-endian, or native-endian length fields through its builder,
//! which *would* cover this case, but it has no hook to log-and-discard a
//! malformed frame rather than erroring the whole stream (§4.1 "MUST NOT
//! tear down the connection on a single malformed frame"), so a small
//! hand-rolled codec is used instead.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::TransportError;

/// Maximum permitted frame payload size (10 MiB). Guards against a
/// corrupted or malicious length prefix causing unbounded buffering.
pub const MAX_FRAME_LEN: u32 = 10 * 1024 * 1024;

const LEN_PREFIX_BYTES: usize = 4;

/// Frames raw byte payloads in and out of the native-messaging stream.
/// Produces/consumes the JSON payload bytes only — serialization to/from
/// [`crate::InboundFrame`]/[`crate::OutboundFrame`] happens one layer up.
#[derive(Debug, Default)]
pub struct NativeMessagingCodec;

impl Decoder for NativeMessagingCodec {
    type Item = BytesMut;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LEN_PREFIX_BYTES {
            return Ok(None);
        }

        let len = u32::from_le_bytes(src[..LEN_PREFIX_BYTES].try_into().unwrap());
        if len > MAX_FRAME_LEN {
            // Drop the bad length prefix so the stream can try to resync on
            // the next read rather than looping forever on the same bytes.
            src.advance(LEN_PREFIX_BYTES);
            return Err(TransportError::FrameTooLarge { len, max: MAX_FRAME_LEN });
        }

        let total = LEN_PREFIX_BYTES + len as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX_BYTES);
        Ok(Some(src.split_to(len as usize)))
    }
}

impl Encoder<BytesMut> for NativeMessagingCodec {
    type Error = TransportError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = u32::try_from(item.len()).map_err(|_| TransportError::FrameTooLarge {
            len: u32::MAX,
            max: MAX_FRAME_LEN,
        })?;
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge { len, max: MAX_FRAME_LEN });
        }
        dst.reserve(LEN_PREFIX_BYTES + item.len());
        dst.put_u32_le(len);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_single_frame() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::new();
        buf.put_u32_le(5);
        buf.extend_from_slice(b"hello");

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn returns_none_on_partial_header() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::from(&[1u8, 2][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn returns_none_on_partial_body() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::new();
        buf.put_u32_le(10);
        buf.extend_from_slice(b"abc");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn rejects_oversized_length_prefix() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::new();
        buf.put_u32_le(MAX_FRAME_LEN + 1);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(BytesMut::from(&b"payload"[..]), &mut buf)
            .unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&decoded[..], b"payload");
    }

    #[test]
    fn decodes_two_frames_from_one_buffer() {
        let mut codec = NativeMessagingCodec;
        let mut buf = BytesMut::new();
        buf.put_u32_le(3);
        buf.extend_from_slice(b"one");
        buf.put_u32_le(3);
        buf.extend_from_slice(b"two");

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"one");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"two");
        assert!(buf.is_empty());
    }
}
