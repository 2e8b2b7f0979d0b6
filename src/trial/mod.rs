//! Free-trial gate.
//!
//! Decides whether the current identity may generate content for free,
//! records consumption and onboarding completion, and reconciles the
//! device-local copy of that state with the identity provider's copy.

pub mod manager;
pub mod model;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;

pub use manager::{FreeUse, TrialEvent, TrialManager, TrialStatus};
pub use model::{GateDecision, IdentityMode, OnboardingRecord, TrialState};
pub use reconcile::{LocalSnapshot, reconcile};
pub use routes::{TrialRouteState, trial_routes};
pub use state::TrialPhase;
pub use storage::{LocalStorage, MemoryLocalStorage, SettingsLocalStorage};
pub use validation::OnboardingForm;
