//! Wishlist API Port - remote mirror of the signed-in user's wishlist.

use async_trait::async_trait;

use crate::domain::foundation::ProductId;
use crate::domain::wishlist::{NewSavedItem, SavedItem};

use super::ApiError;

#[async_trait]
pub trait WishlistApi: Send + Sync {
    async fn fetch_wishlist(&self) -> Result<Vec<SavedItem>, ApiError>;

    /// Save a product. Saving an already saved product leaves the list as is.
    async fn add_wishlist_item(&self, item: &NewSavedItem) -> Result<Vec<SavedItem>, ApiError>;

    /// Remove a product; the backend keys wishlist entries by product.
    async fn remove_wishlist_item(&self, product_id: &ProductId)
        -> Result<Vec<SavedItem>, ApiError>;

    async fn clear_wishlist(&self) -> Result<Vec<SavedItem>, ApiError>;
}
