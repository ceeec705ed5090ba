//! Cart domain.
//!
//! The cart aggregate and its line items. Pure, synchronous, and unaware of
//! whether the session is signed in.

mod aggregate;
mod line_item;

pub use aggregate::{Cart, CartAdd, QuantityChange};
pub use line_item::{LineItem, NewLineItem, VariantKey};
