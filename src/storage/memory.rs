//! In-memory storage gateway.
//!
//! All state lives behind one `tokio::sync::RwLock`. Password hashing runs on
//! the blocking pool so PBKDF2 never stalls the reactor.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{StorageError, StorageGateway, StorageResult, UserId};
use crate::protocol::message::{DataItem, NewDataItem};
use crate::utils::crypto::{self, PasswordRecord};

#[derive(Debug)]
struct UserRecord {
    id: UserId,
    password: PasswordRecord,
}

#[derive(Debug)]
struct StoredItem {
    owner: UserId,
    item: DataItem,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    items: HashMap<String, StoredItem>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn item_count(&self) -> usize {
        self.inner.read().await.items.len()
    }
}

async fn blocking<T, F>(f: F) -> StorageResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Backend(format!("hashing task failed: {e}")))
}

/// `now`, bumped past `previous` when the clock has not advanced.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[async_trait]
impl StorageGateway for MemoryStore {
    async fn create_user(&self, username: &str, password: &str) -> StorageResult<()> {
        if self.inner.read().await.users.contains_key(username) {
            return Err(StorageError::Conflict("User already exists".to_string()));
        }

        let password = password.to_owned();
        let record = blocking(move || crypto::hash_password(&password))
            .await?
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut inner = self.inner.write().await;
        // Re-check: another connection may have registered while we hashed
        if inner.users.contains_key(username) {
            return Err(StorageError::Conflict("User already exists".to_string()));
        }
        inner.users.insert(
            username.to_owned(),
            UserRecord {
                id: UserId::new(),
                password: record,
            },
        );
        debug!(username, "User created");
        Ok(())
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> StorageResult<bool> {
        let stored = self
            .inner
            .read()
            .await
            .users
            .get(username)
            .map(|u| u.password.clone());

        let password = password.to_owned();
        match stored {
            Some(record) => {
                blocking(move || crypto::verify_password(&password, &record.hash, &record.salt))
                    .await
            }
            None => {
                // Same PBKDF2 cost as a real check so unknown names are not faster
                blocking(move || {
                    let _ = crypto::derive_key(password.as_bytes(), &[0u8; crypto::SALT_LEN]);
                    false
                })
                .await
            }
        }
    }

    async fn get_user_id(&self, username: &str) -> StorageResult<UserId> {
        self.inner
            .read()
            .await
            .users
            .get(username)
            .map(|u| u.id)
            .ok_or(StorageError::NotFound)
    }

    async fn list_items_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<DataItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<DataItem> = inner
            .items
            .values()
            .filter(|stored| stored.owner == user_id && stored.item.updated_at > since)
            .map(|stored| stored.item.clone())
            .collect();
        items.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item(&self, user_id: UserId, item_id: &str) -> StorageResult<DataItem> {
        self.inner
            .read()
            .await
            .items
            .get(item_id)
            .filter(|stored| stored.owner == user_id)
            .map(|stored| stored.item.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn create_item(&self, user_id: UserId, item: NewDataItem) -> StorageResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let stored = StoredItem {
            owner: user_id,
            item: DataItem {
                id: id.clone(),
                data_type: item.data_type,
                name: item.name,
                data: item.data,
                metadata: item.metadata,
                created_at: now,
                updated_at: now,
            },
        };

        self.inner.write().await.items.insert(id.clone(), stored);
        debug!(user_id = %user_id, item_id = %id, "Item created");
        Ok(id)
    }

    async fn update_item(
        &self,
        user_id: UserId,
        item_id: &str,
        item: NewDataItem,
    ) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .items
            .get_mut(item_id)
            .filter(|stored| stored.owner == user_id)
            .ok_or(StorageError::NotFound)?;

        stored.item.data_type = item.data_type;
        stored.item.name = item.name;
        stored.item.data = item.data;
        stored.item.metadata = item.metadata;
        stored.item.updated_at = next_timestamp(stored.item.updated_at);
        Ok(())
    }

    async fn delete_item(&self, user_id: UserId, item_id: &str) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .items
            .get(item_id)
            .is_some_and(|stored| stored.owner == user_id);
        if !owned {
            return Err(StorageError::NotFound);
        }
        inner.items.remove(item_id);
        Ok(())
    }
}
