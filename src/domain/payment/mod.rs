//! Payment domain - M-Pesa push payment lifecycle.
//!
//! A push payment prompts the customer's phone out of band; the client learns
//! the result only by polling. This module holds the pure state: phone number
//! normalization, the status machine, and the transaction aggregate that
//! consumes status checks against a bounded attempt budget.

mod phone;
mod status;
mod transaction;

pub use phone::{PhoneFormat, PhoneNumber, INVALID_PHONE_MESSAGE};
pub use status::PaymentStatus;
pub use transaction::{
    MpesaTransaction, PaymentOutcome, PaymentReceipt, PollDecision, StatusCheck,
    PAYMENT_FAILED_MESSAGE, PAYMENT_TIMEOUT_MESSAGE,
};
