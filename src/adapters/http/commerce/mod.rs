//! REST client for the storefront backend.

mod client;
pub mod dto;

pub use client::HttpCommerceApi;
