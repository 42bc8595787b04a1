//! # Vault Protocol Layer
//!
//! Typed messages, per-connection session state and request routing.
//!
//! ## Components
//! - **MessageType**: Closed registry of frame type codes
//! - **Message**: JSON request/response bodies and the `Request` / `Response` sum types
//! - **Session**: Authentication state and outbound message ids for one connection
//! - **Dispatcher**: Auth-gated routing from requests to the storage gateway
//!
//! ## Session lifecycle
//! ```text
//! Unauthenticated --AuthRequest(ok)--> Authenticated
//! ```
//! Only `AuthRequest` and `RegisterRequest` are accepted before authentication.

pub mod dispatcher;
pub mod message;
pub mod message_type;
pub mod session;
