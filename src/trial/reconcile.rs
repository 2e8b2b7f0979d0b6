//! Reconciliation of device-local and identity-provider trial state.
//!
//! Pure: callers gather the snapshots, this decides which copy wins.

use super::model::{DEFAULT_FREE_USES, IdentityMode, OnboardingRecord, TrialState};
use crate::identity::UserMetadata;

/// What device-local storage currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    /// `onboardingComplete == "true"`.
    pub onboarding_complete: bool,
    /// Parsed `freeUsesRemaining`; `None` if absent or unparseable.
    pub free_uses_remaining: Option<u32>,
}

impl LocalSnapshot {
    /// Build from the raw stored strings.
    pub fn from_raw(onboarding_complete: Option<&str>, free_uses_remaining: Option<&str>) -> Self {
        Self {
            onboarding_complete: onboarding_complete.map(str::trim) == Some("true"),
            free_uses_remaining: free_uses_remaining.and_then(|s| s.trim().parse().ok()),
        }
    }
}

/// Resolve the authoritative trial state.
///
/// Precedence:
/// 1. A local completion flag means unlimited, whatever else is stored.
/// 2. Authenticated: remote fields win where present; a missing remote
///    counter takes the local one, then the default.
/// 3. Anonymous: local counter, then the default.
pub fn reconcile(
    local: &LocalSnapshot,
    remote: Option<&UserMetadata>,
    mode: IdentityMode,
) -> TrialState {
    if local.onboarding_complete {
        return TrialState::unlimited(mode);
    }

    match mode {
        IdentityMode::Anonymous => TrialState {
            free_uses_remaining: local.free_uses_remaining.unwrap_or(DEFAULT_FREE_USES),
            ..TrialState::fresh(mode)
        },
        IdentityMode::Authenticated => {
            let empty = UserMetadata::default();
            let remote = remote.unwrap_or(&empty);

            if remote.onboarding_complete == Some(true) {
                return TrialState {
                    onboarding_record: remote
                        .onboarding_data
                        .as_ref()
                        .and_then(|v| serde_json::from_value::<OnboardingRecord>(v.clone()).ok()),
                    ..TrialState::unlimited(mode)
                };
            }

            TrialState {
                free_uses_remaining: remote
                    .free_uses_remaining
                    .or(local.free_uses_remaining)
                    .unwrap_or(DEFAULT_FREE_USES),
                ..TrialState::fresh(mode)
            }
        }
    }
}
