//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Local snapshot storage (file, in-memory)
//! - `http` - REST client for the storefront backend
//! - `mock` - Server-semantics fake backend for tests
//! - `notifications` - Toast center and log sink
//! - `scheduler` - Timer and recording schedulers
//! - `auth` - Bearer token holder

pub mod auth;
pub mod http;
pub mod mock;
pub mod notifications;
pub mod scheduler;
pub mod storage;

pub use auth::StaticTokenProvider;
pub use http::HttpCommerceApi;
pub use mock::MockCommerceApi;
pub use notifications::{ToastCenter, TracingNotificationSink};
pub use scheduler::{RecordingScheduler, TokioScheduler};
pub use storage::{FileLocalStore, InMemoryLocalStore};
