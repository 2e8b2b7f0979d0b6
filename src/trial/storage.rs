//! Device-local trial storage (string key-value).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::store::Database;

/// Client-persisted key-value storage for one device.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Local storage kept in the settings table under `device:<id>`.
pub struct SettingsLocalStorage {
    db: Arc<dyn Database>,
    scope: String,
}

impl SettingsLocalStorage {
    pub fn new(db: Arc<dyn Database>, device_id: &str) -> Self {
        Self {
            db,
            scope: format!("device:{device_id}"),
        }
    }
}

#[async_trait]
impl LocalStorage for SettingsLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .get_setting(&self.scope, key)
            .await
            .map_err(|e| StorageError::ReadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(value.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db
            .set_setting(&self.scope, key, &serde_json::Value::String(value.to_string()))
            .await
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .delete_setting(&self.scope, key)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

/// In-memory local storage.
#[derive(Default)]
pub struct MemoryLocalStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStorage for MemoryLocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
