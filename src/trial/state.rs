//! Trial gate state machine: which phase the current identity is in.

use serde::{Deserialize, Serialize};

use super::model::TrialState;

/// The phases of the trial gate.
///
/// Uninitialized → Loading → {Gated, Blocked, Unlimited}. Any phase returns to
/// Loading when the identity changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    #[default]
    Uninitialized,
    Loading,
    /// Free uses remain.
    Gated,
    /// Free uses exhausted, onboarding not complete.
    Blocked,
    /// Onboarding complete.
    Unlimited,
}

impl TrialPhase {
    /// The resolved phase for a loaded state.
    pub fn of(state: &TrialState) -> Self {
        if state.onboarding_complete {
            Self::Unlimited
        } else if state.free_uses_remaining > 0 {
            Self::Gated
        } else {
            Self::Blocked
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: TrialPhase) -> bool {
        use TrialPhase::*;
        match (self, target) {
            // Identity change forces re-resolution from anywhere
            (_, Loading) => true,
            // Reset
            (Gated | Blocked | Unlimited, Gated) => true,
            (Loading, Gated | Blocked | Unlimited) => true,
            (Gated, Blocked | Unlimited) => true,
            (Blocked, Blocked | Unlimited) => true,
            (Unlimited, Unlimited) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Gated => "gated",
            Self::Blocked => "blocked",
            Self::Unlimited => "unlimited",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::model::IdentityMode;

    #[test]
    fn valid_transitions() {
        use TrialPhase::*;
        let transitions = [
            (Uninitialized, Loading),
            (Loading, Gated),
            (Loading, Blocked),
            (Loading, Unlimited),
            (Gated, Blocked),
            (Blocked, Unlimited),
            (Blocked, Blocked),
            (Unlimited, Unlimited),
            (Unlimited, Gated),
            (Blocked, Gated),
            (Unlimited, Loading),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use TrialPhase::*;
        assert!(!Uninitialized.can_transition_to(Gated));
        assert!(!Uninitialized.can_transition_to(Unlimited));
        assert!(!Unlimited.can_transition_to(Blocked));
        assert!(!Blocked.can_transition_to(Uninitialized));
    }

    #[test]
    fn phase_of_state() {
        let mut state = TrialState::fresh(IdentityMode::Anonymous);
        assert_eq!(TrialPhase::of(&state), TrialPhase::Gated);

        state.free_uses_remaining = 0;
        assert_eq!(TrialPhase::of(&state), TrialPhase::Blocked);

        state.onboarding_complete = true;
        assert_eq!(TrialPhase::of(&state), TrialPhase::Unlimited);
    }


    #[test]
    fn display_matches_serde() {
        use TrialPhase::*;
        for phase in [Uninitialized, Loading, Gated, Blocked, Unlimited] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json, "Display and serde should match for {phase:?}");
        }
    }
}
