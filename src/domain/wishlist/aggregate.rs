//! Wishlist aggregate.
//!
//! Same consistency rules as the cart without quantities: a product/variant
//! pair appears at most once, and `count()` is the number of entries.

use serde::{Deserialize, Serialize};

use crate::domain::cart::VariantKey;
use crate::domain::foundation::{
    ItemId, ProductId, StateMachine, SyncState, Timestamp, ValidationError,
};

use super::{NewSavedItem, SavedItem};

/// Result of [`Wishlist::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistToggle {
    Added(SavedItem),
    Removed(Vec<SavedItem>),
}

/// Saved products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<SavedItem>,
    #[serde(skip)]
    sync_state: SyncState,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a wishlist from a list that may contain duplicates; the first
    /// occurrence of each product/variant wins.
    pub fn from_items(items: Vec<SavedItem>) -> Self {
        let mut wishlist = Self::new();
        wishlist.replace_items(items);
        wishlist
    }

    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn set_sync_state(&mut self, state: SyncState) {
        self.sync_state = state;
    }

    /// Moves to `target` if the sync state machine allows it.
    pub fn transition_sync_state(&mut self, target: SyncState) -> Result<SyncState, ValidationError> {
        self.sync_state = self.sync_state.transition_to(target)?;
        Ok(self.sync_state)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of saved entries.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, id: &ItemId) -> Option<&SavedItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// True when any variant of the product is saved.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    pub fn find_by_key(
        &self,
        product_id: &ProductId,
        variant: Option<&VariantKey>,
    ) -> Option<&SavedItem> {
        self.items
            .iter()
            .find(|item| item.matches(product_id, variant))
    }

    /// Saves a product. Returns `None` when it was already saved.
    pub fn add(&mut self, request: NewSavedItem) -> Option<SavedItem> {
        if self
            .find_by_key(&request.product_id, request.variant.as_ref())
            .is_some()
        {
            return None;
        }
        let item = request.into_saved(ItemId::guest(), Timestamp::now());
        self.items.push(item.clone());
        Some(item)
    }

    /// Removes an entry by id; unknown ids are a no-op.
    pub fn remove(&mut self, id: &ItemId) -> Option<SavedItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Removes every entry for a product.
    pub fn remove_product(&mut self, product_id: &ProductId) -> Vec<SavedItem> {
        let (removed, kept) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| &item.product_id == product_id);
        self.items = kept;
        removed
    }

    /// Saves the product if no variant of it is saved, otherwise removes
    /// every entry for it.
    pub fn toggle(&mut self, request: NewSavedItem) -> WishlistToggle {
        if self.contains(&request.product_id) {
            return WishlistToggle::Removed(self.remove_product(&request.product_id));
        }
        let item = request.into_saved(ItemId::guest(), Timestamp::now());
        self.items.push(item.clone());
        WishlistToggle::Added(item)
    }

    pub fn clear(&mut self) -> Vec<SavedItem> {
        std::mem::take(&mut self.items)
    }

    pub fn replace_items(&mut self, items: Vec<SavedItem>) {
        let mut unique: Vec<SavedItem> = Vec::with_capacity(items.len());
        for item in items {
            if !unique
                .iter()
                .any(|kept| kept.matches(&item.product_id, item.variant.as_ref()))
            {
                unique.push(item);
            }
        }
        self.items = unique;
    }
}
