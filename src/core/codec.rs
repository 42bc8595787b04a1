//! Tokio codec for framing over byte streams.
//!
//! The decoder first waits for the full 10-byte header, checks the declared
//! length against the configured maximum, then waits for exactly that many
//! payload bytes. Partial reads return `Ok(None)` and leave the buffer intact,
//! so TCP fragmentation and coalesced frames are both handled.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::MAX_PAYLOAD_SIZE;
use crate::core::frame::{Frame, FrameHeader, HEADER_LEN};
use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_payload_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }

    /// Codec with a custom payload limit (capped at `MAX_PAYLOAD_SIZE`).
    pub fn with_max_payload_size(max_payload_size: usize) -> Self {
        Self {
            max_payload_size: max_payload_size.min(MAX_PAYLOAD_SIZE),
        }
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let header = FrameHeader::parse(&src[..HEADER_LEN])?;
        let length = header.payload_len();

        // Reject before reserving so a hostile length cannot force an allocation
        if length > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(length));
        }

        let total = HEADER_LEN + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(length);

        Ok(Some(Frame {
            message_type: header.message_type,
            version: header.version,
            message_id: header.message_id,
            payload: payload.to_vec(),
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        if item.payload.len() > self.max_payload_size {
            return Err(ProtocolError::OversizedPacket(item.payload.len()));
        }

        dst.reserve(HEADER_LEN + item.payload.len());
        let header = item.header()?;
        dst.put_slice(&header.to_bytes());
        dst.put_slice(&item.payload);
        Ok(())
    }
}
