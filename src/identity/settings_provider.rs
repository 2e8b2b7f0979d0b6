//! Identity provider backed by the settings table.
//!
//! Holds the session in memory and stores each user's metadata under the
//! `user:<id>` scope.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use super::{AuthenticatedUser, IdentityEvent, IdentityProvider, UserMetadata};
use crate::error::IdentityError;
use crate::store::Database;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

pub struct SettingsIdentityProvider {
    db: Arc<dyn Database>,
    session: RwLock<Option<AuthenticatedUser>>,
    tx: broadcast::Sender<IdentityEvent>,
}

impl SettingsIdentityProvider {
    pub fn new(db: Arc<dyn Database>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            db,
            session: RwLock::new(None),
            tx,
        })
    }

    fn scope(user_id: &str) -> String {
        format!("user:{user_id}")
    }

    /// Start an authenticated session and notify subscribers.
    pub async fn sign_in(&self, user: AuthenticatedUser) {
        let user_id = user.id.clone();
        *self.session.write().await = Some(user);
        info!(user_id = %user_id, "User signed in");
        let _ = self.tx.send(IdentityEvent::SignedIn { user_id });
    }

    /// End the current session. No-op (and no event) if already anonymous.
    pub async fn sign_out(&self) {
        let previous = self.session.write().await.take();
        if let Some(user) = previous {
            info!(user_id = %user.id, "User signed out");
            let _ = self.tx.send(IdentityEvent::SignedOut);
        }
    }
}

#[async_trait]
impl IdentityProvider for SettingsIdentityProvider {
    async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.session.read().await.clone()
    }

    async fn get_user_metadata(&self, user_id: &str) -> Result<UserMetadata, IdentityError> {
        let raw = self
            .db
            .list_settings(&Self::scope(user_id))
            .await
            .map_err(|e| IdentityError::MetadataRead {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(UserMetadata::from_map(&raw))
    }

    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), IdentityError> {
        let scope = Self::scope(user_id);
        for (key, value) in &patch {
            let result = if value.is_null() {
                self.db.delete_setting(&scope, key).await.map(|_| ())
            } else {
                self.db.set_setting(&scope, key, value).await
            };
            result.map_err(|e| IdentityError::MetadataUpdate {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.tx.subscribe()
    }
}
