//! Checkout flows.

mod error;
mod mpesa;

pub use error::CheckoutError;
pub use mpesa::{
    CancelHandle, CheckoutSettings, MpesaCheckout, INITIATION_FAILED_MESSAGE,
    NETWORK_ERROR_MESSAGE,
};
