//! Binary frame format.
//!
//! ```text
//! offset 0   : type        (1 byte)
//! offset 1   : version     (1 byte, PROTOCOL_VERSION)
//! offset 2-5 : message id  (u32, big-endian)
//! offset 6-9 : length      (u32, big-endian)
//! offset 10+ : payload     (length bytes, JSON body)
//! ```

use crate::config::{MAX_PAYLOAD_SIZE, PROTOCOL_VERSION};
use crate::error::{ProtocolError, Result};

/// Fixed header size in bytes
pub const HEADER_LEN: usize = 10;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub message_type: u8,
    pub version: u8,
    pub message_id: u32,
    pub length: u32,
}

impl FrameHeader {
    /// Parse the first [`HEADER_LEN`] bytes of `data`.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` if fewer than 10 bytes are supplied.
    #[inline]
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::InvalidMessage);
        }

        Ok(Self {
            message_type: data[0],
            version: data[1],
            message_id: u32::from_be_bytes([data[2], data[3], data[4], data[5]]),
            length: u32::from_be_bytes([data[6], data[7], data[8], data[9]]),
        })
    }

    /// Write the header into a 10-byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = self.message_type;
        out[1] = self.version;
        out[2..6].copy_from_slice(&self.message_id.to_be_bytes());
        out[6..10].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Declared payload length as `usize`.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}

/// One length-prefixed protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: u8,
    pub version: u8,
    pub message_id: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a frame stamped with the current protocol version.
    pub fn new(message_type: u8, message_id: u32, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            version: PROTOCOL_VERSION,
            message_id,
            payload,
        }
    }

    /// Header describing this frame. `length` is always the payload byte count.
    ///
    /// # Errors
    /// Returns `OversizedPacket` if the payload exceeds `MAX_PAYLOAD_SIZE`,
    /// the same bound [`Frame::from_bytes`] enforces.
    pub fn header(&self) -> Result<FrameHeader> {
        let len = self.payload.len();
        let length = u32::try_from(len)
            .ok()
            .filter(|_| len <= MAX_PAYLOAD_SIZE)
            .ok_or(ProtocolError::OversizedPacket(len))?;

        Ok(FrameHeader {
            message_type: self.message_type,
            version: self.version,
            message_id: self.message_id,
            length,
        })
    }

    /// Encode header and payload into a single buffer.
    ///
    /// # Errors
    /// Returns `OversizedPacket` if the payload exceeds `MAX_PAYLOAD_SIZE`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Decode one frame from the start of `data`.
    ///
    /// A buffer that declares more payload than it holds is rejected rather
    /// than treated as "need more data"; incremental reads go through
    /// [`FrameCodec`](crate::core::codec::FrameCodec). Bytes after the declared
    /// payload are ignored.
    ///
    /// # Errors
    /// - `InvalidMessage` if the header is shorter than 10 bytes
    /// - `OversizedPacket` if the declared length exceeds `MAX_PAYLOAD_SIZE`
    /// - `TruncatedFrame` if fewer payload bytes are present than declared
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = FrameHeader::parse(data)?;
        let expected = header.payload_len();

        if expected > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPacket(expected));
        }

        let actual = data.len() - HEADER_LEN;
        if actual < expected {
            return Err(ProtocolError::TruncatedFrame { expected, actual });
        }

        Ok(Self {
            message_type: header.message_type,
            version: header.version,
            message_id: header.message_id,
            payload: data[HEADER_LEN..HEADER_LEN + expected].to_vec(),
        })
    }
}
