//! M-Pesa transaction aggregate.
//!
//! Tracks one push payment from submission to a terminal status. The amount is
//! captured once at submission and never recomputed.
//!
//! # Invariants
//!
//! - `transaction_id` is set iff initiation succeeded
//! - `attempts <= max_attempts`
//! - Status transitions follow [`PaymentStatus`] rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, OrderId, StateMachine, Timestamp, TransactionId, ValidationError,
};

use super::{PaymentStatus, PhoneNumber};

/// Fallback when the gateway reports failure without a description.
pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed";

/// Reported when the attempt budget runs out.
pub const PAYMENT_TIMEOUT_MESSAGE: &str = "Could not confirm payment in time";

/// Result of one status check against the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCheck {
    Successful,
    Failed { reason: Option<String> },
    /// Any other reported status, e.g. `pending`.
    Pending(String),
    /// The check itself did not complete (network error, non-2xx).
    Unreachable(String),
}

impl StatusCheck {
    /// Maps a raw gateway status string.
    pub fn from_report(status: &str, reason: Option<String>) -> Self {
        match status {
            "successful" => StatusCheck::Successful,
            "failed" => StatusCheck::Failed { reason },
            other => StatusCheck::Pending(other.to_string()),
        }
    }
}

/// Proof of a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: TransactionId,
    pub order_id: OrderId,
    pub phone: PhoneNumber,
    pub amount: Decimal,
    pub confirmed_at: Timestamp,
}

/// Terminal result of a payment flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded(PaymentReceipt),
    Failed {
        transaction_id: Option<TransactionId>,
        reason: String,
    },
    TimedOut {
        transaction_id: TransactionId,
        attempts: u32,
    },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded(_))
    }

    pub fn status(&self) -> PaymentStatus {
        match self {
            PaymentOutcome::Succeeded(_) => PaymentStatus::Succeeded,
            PaymentOutcome::Failed { .. } => PaymentStatus::Failed,
            PaymentOutcome::TimedOut { .. } => PaymentStatus::TimedOut,
        }
    }

    /// User-facing message; distinct for failure and timeout.
    pub fn message(&self) -> &str {
        match self {
            PaymentOutcome::Succeeded(_) => "Payment received",
            PaymentOutcome::Failed { reason, .. } => reason,
            PaymentOutcome::TimedOut { .. } => PAYMENT_TIMEOUT_MESSAGE,
        }
    }
}

/// What to do after recording a status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    Continue { attempts_left: u32 },
    Resolved(PaymentOutcome),
}

/// One push payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpesaTransaction {
    order_id: OrderId,
    phone: PhoneNumber,
    amount: Decimal,
    transaction_id: Option<TransactionId>,
    status: PaymentStatus,
    attempts: u32,
    max_attempts: u32,
    failure: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl MpesaTransaction {
    /// Starts a payment in `initiating`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the amount is not positive or the
    /// attempt budget is zero.
    pub fn submit(
        order_id: OrderId,
        phone: PhoneNumber,
        amount: Decimal,
        max_attempts: u32,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::invalid_format(
                "amount",
                "amount must be positive",
            ));
        }
        if max_attempts == 0 {
            return Err(ValidationError::out_of_range("max_attempts", 1, i64::from(u32::MAX), 0));
        }
        let status = PaymentStatus::Idle.transition_to(PaymentStatus::Initiating)?;
        let now = Timestamp::now();
        Ok(Self {
            order_id,
            phone,
            amount,
            transaction_id: None,
            status,
            attempts: 0,
            max_attempts,
            failure: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Status checks consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempts_left(&self) -> u32 {
        self.max_attempts - self.attempts
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// The gateway accepted the push request.
    ///
    /// # Errors
    ///
    /// Returns error if the transaction is not `initiating`.
    pub fn mark_initiated(&mut self, transaction_id: TransactionId) -> Result<(), DomainError> {
        self.transition(PaymentStatus::AwaitingConfirmation)?;
        self.transaction_id = Some(transaction_id);
        Ok(())
    }

    /// The gateway rejected the push request; `reason` is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns error if the transaction is not `initiating`.
    pub fn mark_rejected(&mut self, reason: impl Into<String>) -> Result<PaymentOutcome, DomainError> {
        if self.status != PaymentStatus::Initiating {
            return Err(self.invalid_transition(PaymentStatus::Failed));
        }
        self.transition(PaymentStatus::Failed)?;
        let reason = reason.into();
        self.failure = Some(reason.clone());
        Ok(PaymentOutcome::Failed {
            transaction_id: None,
            reason,
        })
    }

    /// Applies one status check, consuming one attempt.
    ///
    /// # Errors
    ///
    /// Returns error if the transaction is not awaiting confirmation.
    pub fn record_check(&mut self, check: StatusCheck) -> Result<PollDecision, DomainError> {
        if !self.status.is_awaiting() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot record a status check while {:?}", self.status),
            ));
        }
        self.attempts += 1;

        match check {
            StatusCheck::Successful => {
                self.transition(PaymentStatus::Succeeded)?;
                Ok(PollDecision::Resolved(self.outcome_or_internal()?))
            }
            StatusCheck::Failed { reason } => {
                self.transition(PaymentStatus::Failed)?;
                self.failure = Some(
                    reason
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string()),
                );
                Ok(PollDecision::Resolved(self.outcome_or_internal()?))
            }
            StatusCheck::Pending(_) | StatusCheck::Unreachable(_) => {
                if self.attempts >= self.max_attempts {
                    self.transition(PaymentStatus::TimedOut)?;
                    Ok(PollDecision::Resolved(self.outcome_or_internal()?))
                } else {
                    Ok(PollDecision::Continue {
                        attempts_left: self.attempts_left(),
                    })
                }
            }
        }
    }

    /// The terminal outcome, if the transaction has reached one.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.status {
            PaymentStatus::Succeeded => {
                let transaction_id = self.transaction_id.clone()?;
                Some(PaymentOutcome::Succeeded(PaymentReceipt {
                    transaction_id,
                    order_id: self.order_id.clone(),
                    phone: self.phone.clone(),
                    amount: self.amount,
                    confirmed_at: self.updated_at,
                }))
            }
            PaymentStatus::Failed => Some(PaymentOutcome::Failed {
                transaction_id: self.transaction_id.clone(),
                reason: self
                    .failure
                    .clone()
                    .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string()),
            }),
            PaymentStatus::TimedOut => Some(PaymentOutcome::TimedOut {
                transaction_id: self.transaction_id.clone()?,
                attempts: self.attempts,
            }),
            _ => None,
        }
    }

    fn outcome_or_internal(&self) -> Result<PaymentOutcome, DomainError> {
        self.outcome().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                "terminal transaction without a transaction id",
            )
        })
    }

    fn transition(&mut self, target: PaymentStatus) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| self.invalid_transition(target))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn invalid_transition(&self, target: PaymentStatus) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot transition payment from {:?} to {:?}", self.status, target),
        )
        .with_detail("order_id", self.order_id.as_str())
    }
}
