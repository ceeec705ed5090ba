//! Push-payment status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of one M-Pesa push payment.
///
/// ```text
/// idle -> initiating -> awaiting_confirmation -> succeeded
///              |                 |-------------> failed
///              |                 `-------------> timed_out
///              `--------------------------------> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Idle,
    Initiating,
    AwaitingConfirmation,
    Succeeded,
    Failed,
    TimedOut,
}

impl PaymentStatus {
    /// Polling only happens in this state.
    pub fn is_awaiting(&self) -> bool {
        matches!(self, PaymentStatus::AwaitingConfirmation)
    }

    /// Initiating or awaiting confirmation.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Initiating | PaymentStatus::AwaitingConfirmation
        )
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Idle, Initiating)
                | (Initiating, AwaitingConfirmation)
                | (Initiating, Failed)
                | (AwaitingConfirmation, Succeeded)
                | (AwaitingConfirmation, Failed)
                | (AwaitingConfirmation, TimedOut)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Idle => vec![Initiating],
            Initiating => vec![AwaitingConfirmation, Failed],
            AwaitingConfirmation => vec![Succeeded, Failed, TimedOut],
            Succeeded | Failed | TimedOut => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(PaymentStatus::Succeeded.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::TimedOut.is_terminal());
        assert!(!PaymentStatus::Idle.is_terminal());
        assert!(!PaymentStatus::Initiating.is_terminal());
        assert!(!PaymentStatus::AwaitingConfirmation.is_terminal());
    }

    #[test]
    fn initiating_cannot_skip_confirmation_to_success() {
        assert!(PaymentStatus::Initiating
            .transition_to(PaymentStatus::Succeeded)
            .is_err());
        assert!(PaymentStatus::Initiating
            .transition_to(PaymentStatus::TimedOut)
            .is_err());
    }

    #[test]
    fn failed_reachable_from_initiating_and_awaiting() {
        assert!(PaymentStatus::Initiating.can_transition_to(&PaymentStatus::Failed));
        assert!(PaymentStatus::AwaitingConfirmation.can_transition_to(&PaymentStatus::Failed));
        assert!(!PaymentStatus::Idle.can_transition_to(&PaymentStatus::Failed));
    }

    #[test]
    fn in_flight_states() {
        assert!(PaymentStatus::Initiating.is_in_flight());
        assert!(PaymentStatus::AwaitingConfirmation.is_in_flight());
        assert!(!PaymentStatus::Succeeded.is_in_flight());
        assert!(!PaymentStatus::Idle.is_in_flight());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::AwaitingConfirmation).unwrap(),
            "\"awaiting_confirmation\""
        );
    }
}
