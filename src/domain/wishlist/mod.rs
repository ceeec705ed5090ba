//! Wishlist domain.

mod aggregate;
mod saved_item;

pub use aggregate::{Wishlist, WishlistToggle};
pub use saved_item::{NewSavedItem, SavedItem};
