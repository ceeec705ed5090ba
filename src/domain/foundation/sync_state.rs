//! Synchronization state shared by the cart and wishlist aggregates.

use serde::{Deserialize, Serialize};

use super::StateMachine;

/// Whether the session is signed out (local only) or signed in (server mirrored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Guest,
    Authenticated,
}

impl SessionMode {
    /// Mode implied by the presence of a bearer token.
    pub fn from_token_present(present: bool) -> Self {
        if present {
            SessionMode::Authenticated
        } else {
            SessionMode::Guest
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionMode::Authenticated)
    }
}

/// Where an aggregate stands relative to its authoritative copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Signed out; local storage is the only copy.
    #[default]
    Guest,

    /// A remote call is in flight.
    Syncing,

    /// The last remote call succeeded and was reconciled.
    Synced,

    /// The last remote call failed; local state was kept.
    Error,
}

impl StateMachine for SyncState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SyncState::*;
        matches!(
            (self, target),
            (Guest, Guest)
                | (Guest, Syncing)
                | (Syncing, Syncing)
                | (Syncing, Synced)
                | (Syncing, Error)
                | (Synced, Syncing)
                | (Synced, Error)
                | (Error, Syncing)
                | (Error, Synced)
                | (Syncing, Guest)
                | (Synced, Guest)
                | (Error, Guest)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SyncState::*;
        match self {
            Guest => vec![Guest, Syncing],
            Syncing => vec![Syncing, Synced, Error, Guest],
            Synced => vec![Syncing, Error, Guest],
            Error => vec![Syncing, Synced, Guest],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_mode_follows_token_presence() {
        assert_eq!(SessionMode::from_token_present(false), SessionMode::Guest);
        assert!(SessionMode::from_token_present(true).is_authenticated());
    }

    #[test]
    fn guest_cannot_jump_straight_to_synced() {
        assert!(SyncState::Guest.transition_to(SyncState::Synced).is_err());
        assert_eq!(
            SyncState::Guest.transition_to(SyncState::Syncing),
            Ok(SyncState::Syncing)
        );
    }

    #[test]
    fn error_recovers_through_syncing() {
        assert!(SyncState::Error.can_transition_to(&SyncState::Syncing));
        assert!(SyncState::Syncing.can_transition_to(&SyncState::Synced));
    }

    #[test]
    fn late_failure_can_follow_synced() {
        assert!(SyncState::Synced.can_transition_to(&SyncState::Error));
    }

    #[test]
    fn no_state_is_terminal() {
        for state in [
            SyncState::Guest,
            SyncState::Syncing,
            SyncState::Synced,
            SyncState::Error,
        ] {
            assert!(!state.is_terminal());
        }
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SyncState::Synced).unwrap(), "\"synced\"");
    }
}
