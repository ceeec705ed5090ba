//! Application layer - coordinators and flows.
//!
//! This layer orchestrates domain aggregates and coordinates between ports.
//! Sync keeps the cart and wishlist consistent, checkout drives payments, and
//! the session wires both for one UI lifetime.

pub mod checkout;
pub mod session;
pub mod sync;

pub use checkout::{CancelHandle, CheckoutError, CheckoutSettings, MpesaCheckout};
pub use session::{SessionPorts, SessionSettings, StorefrontSession};
pub use sync::{CartSync, SyncError, WishlistSync};
