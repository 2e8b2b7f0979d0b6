//! `Database` trait: async interface for settings persistence.
//!
//! Both device-local trial storage and identity metadata live in the
//! `settings` table, each under its own `user_id` scope.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Backend-agnostic database trait.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Get a single setting, `None` if absent.
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or replace a setting.
    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Delete a setting. Returns whether a row was removed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;

    /// All settings for a scope as a JSON object.
    async fn list_settings(
        &self,
        user_id: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, DatabaseError>;
}
