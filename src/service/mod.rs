//! # Network Service
//!
//! Server, per-connection handler and client for the vault protocol.
//!
//! ## Components
//! - **Server**: TCP accept loop with a connection limit and graceful shutdown
//! - **ConnectionHandler**: Read-dispatch-write loop with idle and write deadlines
//! - **Client**: Typed calls for every request plus client-side item encryption

pub mod client;
pub mod connection;
pub mod server;

pub use client::Client;
pub use connection::ConnectionHandler;
pub use server::Server;
