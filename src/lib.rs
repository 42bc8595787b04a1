//! # vault-protocol
//!
//! An encrypted secrets vault spoken over a small binary protocol.
//!
//! Each frame carries a 10-byte header followed by a JSON body:
//!
//! ```text
//! [Type(1)] [Version(1)] [MessageId(4)] [Length(4)] [Payload(N)]
//! ```
//!
//! Item contents are sealed on the client with ChaCha20-Poly1305 under a key
//! derived from the account password, so the server only stores ciphertext.
//!
//! ## Layout
//! - [`core`]: frame format, stream codec, JSON helpers
//! - [`protocol`]: message registry, typed bodies, session state, dispatcher
//! - [`storage`]: storage gateway contract and the in-memory store
//! - [`service`]: TCP server, connection handler, client
//! - [`utils`]: crypto, logging, metrics, deadlines
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use vault_protocol::config::VaultConfig;
//! use vault_protocol::service::Server;
//! use vault_protocol::storage::MemoryStore;
//!
//! # async fn run() -> vault_protocol::Result<()> {
//! let config = VaultConfig::from_env()?;
//! let server = Server::bind(&config, Arc::new(MemoryStore::new())).await?;
//! server.run().await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod storage;
pub mod utils;

pub use crate::core::frame::{Frame, FrameHeader};
pub use crate::error::{ProtocolError, Result};
