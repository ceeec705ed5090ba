//! Storefront Sync - client core for a storefront front-end
//!
//! This crate keeps a shopper's cart and wishlist consistent across guest
//! (local snapshot) and signed-in (server mirror) sessions, and drives the
//! M-Pesa push payment confirmation loop at checkout.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
