//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, metrics and deadlines.
//!
//! ## Components
//! - **Crypto**: PBKDF2 password records and ChaCha20-Poly1305 envelopes
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters
//! - **Timeout**: Async timeout wrappers
//!
//! ## Security
//! - Cryptographically secure RNG (getrandom)
//! - Memory zeroing for key material and plaintext (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod timeout;
