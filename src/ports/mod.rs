//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage
//!
//! - `LocalStore` - Durable key/value storage for guest snapshots
//!
//! ## Remote Backend
//!
//! - `CartApi` / `WishlistApi` - Server mirrors returning canonical lists
//! - `PaymentGateway` - M-Pesa push initiation and status polling
//! - `ApiError` - Failure taxonomy shared by remote ports
//!
//! ## Session Plumbing
//!
//! - `NotificationSink` - User-facing toasts
//! - `Scheduler` - Injected delay for the payment poll loop
//! - `TokenProvider` - Bearer token presence

mod api_error;
mod cart_api;
mod local_store;
mod notification_sink;
mod payment_gateway;
mod scheduler;
mod token_provider;
mod wishlist_api;

pub use api_error::ApiError;
pub use cart_api::CartApi;
pub use local_store::{LocalStore, StorageError};
pub use notification_sink::NotificationSink;
pub use payment_gateway::{
    InitiationRequest, InitiationResponse, PaymentGateway, PaymentStatusReport,
};
pub use scheduler::Scheduler;
pub use token_provider::TokenProvider;
pub use wishlist_api::WishlistApi;
