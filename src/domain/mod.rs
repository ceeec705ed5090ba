//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `cart` - Cart aggregate with merge-by-SKU line items and derived totals
//! - `wishlist` - Saved products, one entry per product/variant
//! - `payment` - M-Pesa push payment lifecycle
//! - `notification` - Toast messages surfaced to the user

pub mod cart;
pub mod foundation;
pub mod notification;
pub mod payment;
pub mod wishlist;
