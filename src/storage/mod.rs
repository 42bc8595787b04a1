//! # Storage Gateway
//!
//! The contract between the session layer and persistent storage.
//!
//! Every item operation is scoped to the owning [`UserId`]. An item that
//! exists but belongs to someone else is reported exactly like a missing
//! one, so callers cannot probe for foreign ids.
//!
//! [`MemoryStore`] is the in-process implementation used by the server
//! binary and the test suites.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::message::{DataItem, NewDataItem};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Internal account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
pub trait StorageGateway: Send + Sync + 'static {
    /// Create an account, deriving a fresh password record.
    ///
    /// Returns `Conflict` if the username is taken.
    async fn create_user(&self, username: &str, password: &str) -> StorageResult<()>;

    /// `Ok(false)` for both an unknown user and a wrong password.
    async fn verify_credentials(&self, username: &str, password: &str) -> StorageResult<bool>;

    async fn get_user_id(&self, username: &str) -> StorageResult<UserId>;

    /// Items with `updated_at > since`, ascending by `updated_at`.
    async fn list_items_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<DataItem>>;

    async fn get_item(&self, user_id: UserId, item_id: &str) -> StorageResult<DataItem>;

    /// Store a new item and return its id.
    async fn create_item(&self, user_id: UserId, item: NewDataItem) -> StorageResult<String>;

    /// Replace the item's contents and move `updated_at` strictly forward.
    async fn update_item(
        &self,
        user_id: UserId,
        item_id: &str,
        item: NewDataItem,
    ) -> StorageResult<()>;

    async fn delete_item(&self, user_id: UserId, item_id: &str) -> StorageResult<()>;
}
