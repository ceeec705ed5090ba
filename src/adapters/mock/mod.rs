//! Mock adapters for tests and local development.

mod mock_commerce_api;

pub use mock_commerce_api::{CallGate, MethodCall, MockCommerceApi};
