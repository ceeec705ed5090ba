//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the storefront domain.

mod errors;
mod ids;
mod state_machine;
mod sync_state;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ItemId, NotificationId, OrderId, ProductId, TransactionId};
pub use state_machine::StateMachine;
pub use sync_state::{SessionMode, SyncState};
pub use timestamp::Timestamp;
