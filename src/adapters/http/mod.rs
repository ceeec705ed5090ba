//! HTTP adapters - clients for the storefront REST backend.

pub mod commerce;

pub use commerce::HttpCommerceApi;
