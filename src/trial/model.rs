//! Trial state and onboarding data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free generations granted to a fresh (or reset) identity.
pub const DEFAULT_FREE_USES: u32 = 1;

/// Which backing store is authoritative for the trial state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Device-local storage is authoritative.
    #[default]
    Anonymous,
    /// Identity-provider metadata is authoritative.
    Authenticated,
}

impl std::fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Lead data captured by the onboarding form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub submitted_at: DateTime<Utc>,
}

/// Whether a generation may run right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Allowed,
    OnboardingRequired,
}

/// The trial state of the current identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    /// Generations left before onboarding is required. Ignored once complete.
    pub free_uses_remaining: u32,
    pub onboarding_complete: bool,
    pub identity_mode: IdentityMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_record: Option<OnboardingRecord>,
}

impl Default for TrialState {
    fn default() -> Self {
        Self::fresh(IdentityMode::Anonymous)
    }
}

impl TrialState {
    /// `{free_uses_remaining: 1, onboarding_complete: false}` for `mode`.
    ///
    /// Also the fallback whenever a store read fails.
    pub fn fresh(identity_mode: IdentityMode) -> Self {
        Self {
            free_uses_remaining: DEFAULT_FREE_USES,
            onboarding_complete: false,
            identity_mode,
            onboarding_record: None,
        }
    }

    /// Onboarded state: unlimited use, counter zeroed.
    pub fn unlimited(identity_mode: IdentityMode) -> Self {
        Self {
            free_uses_remaining: 0,
            onboarding_complete: true,
            identity_mode,
            onboarding_record: None,
        }
    }

    /// Gate check. Completion always wins over the counter.
    pub fn gate(&self) -> GateDecision {
        if self.onboarding_complete || self.free_uses_remaining > 0 {
            GateDecision::Allowed
        } else {
            GateDecision::OnboardingRequired
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.gate() == GateDecision::Allowed
    }
}

/// Keys used in device-local storage.
pub mod local_keys {
    /// `"true"` once onboarding completed on this device; absent otherwise.
    pub const ONBOARDING_COMPLETE: &str = "onboardingComplete";
    /// Decimal string.
    pub const FREE_USES_REMAINING: &str = "freeUsesRemaining";
    /// JSON onboarding record (anonymous-path backup).
    pub const ONBOARDING_DATA: &str = "onboardingData";
}
