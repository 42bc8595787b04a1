//! # Error Types
//!
//! Error handling for the vault protocol.
//!
//! This module defines every error variant that can occur while framing,
//! dispatching, encrypting or storing data, from low-level I/O failures to
//! server-reported errors surfaced on the client.
//!
//! ## Error Categories
//! - **I/O Errors**: Network failures, closed connections, deadlines
//! - **Framing Errors**: Short headers, truncated or oversized frames, unknown type codes
//! - **Cryptographic Errors**: Key derivation, encryption and decryption failures
//! - **Storage Errors**: Failures reported by the storage gateway
//! - **Server Errors**: `ErrorResponse` frames received by the client
//!
//! ## Example Usage
//! ```rust
//! use vault_protocol::core::frame::Frame;
//! use vault_protocol::error::{ProtocolError, Result};
//!
//! fn header_only(bytes: &[u8]) -> Result<u8> {
//!     let frame = Frame::from_bytes(bytes)?;
//!     Ok(frame.message_type)
//! }
//!
//! assert!(matches!(header_only(&[0x01, 0x01]), Err(ProtocolError::InvalidMessage)));
//! ```

use crate::storage::StorageError;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_INVALID_MESSAGE: &str = "Invalid message format";
    pub const ERR_UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";
    pub const ERR_UNEXPECTED_MESSAGE: &str = "Unexpected message type";
    pub const ERR_OVERSIZED_PACKET: &str = "Message exceeds maximum size";

    /// Session errors
    pub const ERR_NOT_AUTHENTICATED: &str = "Not authenticated";
    pub const ERR_AUTH_FAILED: &str = "Authentication failed: invalid credentials";
    pub const ERR_ALREADY_AUTHENTICATED: &str = "Session already authenticated";
    pub const ERR_AUTH_ERROR: &str = "Authentication error";
    pub const ERR_EMPTY_CREDENTIALS: &str = "Username and password must not be empty";

    /// Storage errors
    pub const ERR_DATA_NOT_FOUND: &str = "Data not found";
    pub const ERR_SYNC_FAILED: &str = "Failed to get data";

    /// Cryptographic errors
    pub const ERR_ENCRYPTION_FAILED: &str = "Encryption failed";
    pub const ERR_DECRYPTION_FAILED: &str = "Decryption failed";

    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed";
    pub const ERR_CONNECTION_TIMEOUT: &str = "Connection timed out (no activity)";
    pub const ERR_TIMEOUT: &str = "Operation timed out";
    pub const ERR_SYSTEM_TIME: &str = "System time error: time went backwards";
}

/// Error codes carried inside `ErrorResponse` frames.
pub mod codes {
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const PAYLOAD_TOO_LARGE: u16 = 413;
    pub const INTERNAL: u16 = 500;
}

// ProtocolError is the primary error type for all vault operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid message")]
    InvalidMessage,

    #[error("Truncated frame: header declares {expected} payload bytes, {actual} available")]
    TruncatedFrame { expected: usize, actual: usize },

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    #[error("Unknown data type: 0x{0:02X}")]
    UnknownDataType(u8),

    #[error("Unexpected message type")]
    UnexpectedMessage,

    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Connection timed out (no activity)")]
    ConnectionTimeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Server error {code}: {message}")]
    Server { code: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
