//! Errors raised by the checkout flow.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ValidationError};
use crate::domain::payment::PaymentStatus;

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    /// Bad phone number, order id or amount. Nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A payment for this flow is still initiating or awaiting confirmation.
    #[error("A payment for order {order_id} is already in progress")]
    AlreadyInFlight { order_id: OrderId },

    /// The gateway refused the push, or could not be reached. The message is
    /// meant for the customer.
    #[error("{reason}")]
    Rejected { reason: String },

    /// Polling was requested without a transaction awaiting confirmation.
    #[error("No payment is awaiting confirmation (status: {status:?})")]
    NotAwaiting { status: PaymentStatus },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<CheckoutError> for DomainError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Domain(e) => e,
            CheckoutError::Validation(e) => e.into(),
            CheckoutError::AlreadyInFlight { ref order_id } => {
                DomainError::new(ErrorCode::PaymentInFlight, err.to_string())
                    .with_detail("order_id", order_id.to_string())
            }
            CheckoutError::Rejected { .. } => {
                DomainError::new(ErrorCode::UpstreamRejected, err.to_string())
            }
            CheckoutError::NotAwaiting { .. } => {
                DomainError::new(ErrorCode::InvalidStateTransition, err.to_string())
            }
        }
    }
}
