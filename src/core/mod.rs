//! # Core Protocol Components
//!
//! Low-level frame handling, stream codec, and JSON payload helpers.
//!
//! ## Components
//! - **Frame**: Fixed 10-byte header plus variable payload
//! - **Codec**: Tokio codec for framing over byte streams
//! - **Serialization**: Serde helpers for base64 byte fields and timestamps
//!
//! ## Wire Format
//! ```text
//! [Type(1)] [Version(1)] [MessageId(4)] [Length(4)] [Payload(N)]
//! ```
//!
//! ## Security
//! - Maximum payload size: 50MB (prevents memory exhaustion)
//! - Length validation before allocation

pub mod codec;
pub mod frame;
pub mod serialization;
