//! Identity provider: authentication state and per-user metadata.
//!
//! The trial gate treats the provider as an opaque key-value store with an
//! event stream of sign-in/sign-out notifications.

pub mod routes;
pub mod settings_provider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::IdentityError;

pub use routes::{SessionRouteState, session_routes};
pub use settings_provider::SettingsIdentityProvider;

/// Metadata field names written by the trial gate.
pub mod metadata_keys {
    pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";
    pub const FREE_USES_REMAINING: &str = "free_uses_remaining";
    pub const ONBOARDING_DATA: &str = "onboarding_data";
    pub const ONBOARDING_DATE: &str = "onboarding_date";
}

/// The currently signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Identity-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdentityEvent {
    SignedIn { user_id: String },
    SignedOut,
}

/// Trial-related view of a user's metadata. Missing fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMetadata {
    pub onboarding_complete: Option<bool>,
    pub free_uses_remaining: Option<u32>,
    pub onboarding_data: Option<serde_json::Value>,
    pub onboarding_date: Option<DateTime<Utc>>,
}

impl UserMetadata {
    /// Parse the trial fields out of a raw metadata object.
    ///
    /// Fields of the wrong type are treated as absent.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let free_uses_remaining = map
            .get(metadata_keys::FREE_USES_REMAINING)
            .and_then(|v| match v {
                serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
                other => other.as_u64(),
            })
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX));

        Self {
            onboarding_complete: map
                .get(metadata_keys::ONBOARDING_COMPLETE)
                .and_then(|v| v.as_bool()),
            free_uses_remaining,
            onboarding_data: map
                .get(metadata_keys::ONBOARDING_DATA)
                .filter(|v| !v.is_null())
                .cloned(),
            onboarding_date: map
                .get(metadata_keys::ONBOARDING_DATE)
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Backend-agnostic identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` for an anonymous session.
    async fn current_user(&self) -> Option<AuthenticatedUser>;

    /// Read a user's metadata.
    async fn get_user_metadata(&self, user_id: &str) -> Result<UserMetadata, IdentityError>;

    /// Merge `patch` into a user's metadata. `null` values remove a field.
    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), IdentityError>;

    /// Subscribe to identity-change events.
    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}
