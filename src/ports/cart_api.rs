//! Cart API Port - remote mirror of the signed-in user's cart.
//!
//! Every mutating call returns the server's canonical line list, which the
//! sync coordinator uses to reconcile local state.

use async_trait::async_trait;

use crate::domain::cart::{LineItem, NewLineItem};
use crate::domain::foundation::ItemId;

use super::ApiError;

#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the canonical cart.
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, ApiError>;

    /// Add `item.quantity` units of a SKU. The server sums quantities when
    /// the SKU is already present.
    async fn add_cart_item(&self, item: &NewLineItem) -> Result<Vec<LineItem>, ApiError>;

    /// Set the quantity of a server-side line.
    async fn update_cart_item(&self, id: &ItemId, quantity: u32)
        -> Result<Vec<LineItem>, ApiError>;

    async fn remove_cart_item(&self, id: &ItemId) -> Result<Vec<LineItem>, ApiError>;

    async fn clear_cart(&self) -> Result<Vec<LineItem>, ApiError>;
}
