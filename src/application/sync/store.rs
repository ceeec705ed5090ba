//! Store strategies.
//!
//! A coordinator holds exactly one active strategy per aggregate:
//! [`LocalOnlyStore`] while signed out and [`RemoteBackedStore`] while signed
//! in. Operations never branch on token presence; they ask the active store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::cart::{LineItem, NewLineItem};
use crate::domain::foundation::{ItemId, ProductId, SessionMode};
use crate::domain::wishlist::{NewSavedItem, SavedItem};
use crate::ports::{ApiError, CartApi, LocalStore, StorageError, WishlistApi};

use super::snapshot::{read_items, write_items};
use super::SyncError;

/// Remote effect of a local cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    Add(NewLineItem),
    /// `line` is the row after the local update.
    SetQuantity { line: LineItem, quantity: u32 },
    Remove(LineItem),
    Clear,
}

/// Remote effect of a local wishlist mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistMutation {
    Add(NewSavedItem),
    RemoveProduct(ProductId),
    Clear,
}

#[async_trait]
pub trait CartStore: Send + Sync {
    fn mode(&self) -> SessionMode;

    /// Items the aggregate starts from.
    async fn load(&self) -> Result<Vec<LineItem>, SyncError>;

    /// Called after every local mutation with the new items.
    async fn persist(&self, items: &[LineItem]) -> Result<(), StorageError>;

    /// Forward a mutation. `Some` carries the canonical list to reconcile with.
    async fn forward(&self, mutation: &CartMutation) -> Result<Option<Vec<LineItem>>, ApiError>;

    /// Drop whatever this store persisted.
    async fn discard(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    fn mode(&self) -> SessionMode;

    async fn load(&self) -> Result<Vec<SavedItem>, SyncError>;

    async fn persist(&self, items: &[SavedItem]) -> Result<(), StorageError>;

    async fn forward(
        &self,
        mutation: &WishlistMutation,
    ) -> Result<Option<Vec<SavedItem>>, ApiError>;

    async fn discard(&self) -> Result<(), StorageError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Guest
// ════════════════════════════════════════════════════════════════════════════════

/// Signed-out strategy: state lives in a local snapshot only.
pub struct LocalOnlyStore {
    store: Arc<dyn LocalStore>,
    key: String,
}

impl LocalOnlyStore {
    pub fn new(store: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl CartStore for LocalOnlyStore {
    fn mode(&self) -> SessionMode {
        SessionMode::Guest
    }

    async fn load(&self) -> Result<Vec<LineItem>, SyncError> {
        Ok(read_items(self.store.as_ref(), &self.key).await)
    }

    async fn persist(&self, items: &[LineItem]) -> Result<(), StorageError> {
        write_items(self.store.as_ref(), &self.key, items).await
    }

    async fn forward(&self, _mutation: &CartMutation) -> Result<Option<Vec<LineItem>>, ApiError> {
        Ok(None)
    }

    async fn discard(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key).await
    }
}

#[async_trait]
impl WishlistStore for LocalOnlyStore {
    fn mode(&self) -> SessionMode {
        SessionMode::Guest
    }

    async fn load(&self) -> Result<Vec<SavedItem>, SyncError> {
        Ok(read_items(self.store.as_ref(), &self.key).await)
    }

    async fn persist(&self, items: &[SavedItem]) -> Result<(), StorageError> {
        write_items(self.store.as_ref(), &self.key, items).await
    }

    async fn forward(
        &self,
        _mutation: &WishlistMutation,
    ) -> Result<Option<Vec<SavedItem>>, ApiError> {
        Ok(None)
    }

    async fn discard(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key).await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Signed in
// ════════════════════════════════════════════════════════════════════════════════

/// Signed-in strategy: the server is authoritative and nothing is persisted
/// locally.
pub struct RemoteBackedStore<A: ?Sized> {
    api: Arc<A>,
}

impl<A: ?Sized> RemoteBackedStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

impl<A: CartApi + ?Sized> RemoteBackedStore<A> {
    /// Server id for a line. Lines added locally keep a guest id until
    /// reconciled; those are found on the server by SKU.
    async fn server_line_id(&self, line: &LineItem) -> Result<Option<ItemId>, ApiError> {
        if !line.id.is_guest() {
            return Ok(Some(line.id.clone()));
        }
        let remote = self.api.fetch_cart().await?;
        Ok(remote
            .into_iter()
            .find(|candidate| candidate.matches(&line.product_id, line.variant.as_ref()))
            .map(|candidate| candidate.id))
    }
}

#[async_trait]
impl<A: CartApi + ?Sized> CartStore for RemoteBackedStore<A> {
    fn mode(&self) -> SessionMode {
        SessionMode::Authenticated
    }

    async fn load(&self) -> Result<Vec<LineItem>, SyncError> {
        Ok(self.api.fetch_cart().await?)
    }

    async fn persist(&self, _items: &[LineItem]) -> Result<(), StorageError> {
        Ok(())
    }

    async fn forward(&self, mutation: &CartMutation) -> Result<Option<Vec<LineItem>>, ApiError> {
        let items = match mutation {
            CartMutation::Add(item) => self.api.add_cart_item(item).await?,
            CartMutation::SetQuantity { line, quantity } => {
                match self.server_line_id(line).await? {
                    Some(id) => self.api.update_cart_item(&id, *quantity).await?,
                    None => self.api.fetch_cart().await?,
                }
            }
            CartMutation::Remove(line) => match self.server_line_id(line).await? {
                Some(id) => self.api.remove_cart_item(&id).await?,
                None => self.api.fetch_cart().await?,
            },
            CartMutation::Clear => self.api.clear_cart().await?,
        };
        Ok(Some(items))
    }

    async fn discard(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl<A: WishlistApi + ?Sized> WishlistStore for RemoteBackedStore<A> {
    fn mode(&self) -> SessionMode {
        SessionMode::Authenticated
    }

    async fn load(&self) -> Result<Vec<SavedItem>, SyncError> {
        Ok(self.api.fetch_wishlist().await?)
    }

    async fn persist(&self, _items: &[SavedItem]) -> Result<(), StorageError> {
        Ok(())
    }

    async fn forward(
        &self,
        mutation: &WishlistMutation,
    ) -> Result<Option<Vec<SavedItem>>, ApiError> {
        let items = match mutation {
            WishlistMutation::Add(item) => self.api.add_wishlist_item(item).await?,
            WishlistMutation::RemoveProduct(product_id) => {
                self.api.remove_wishlist_item(product_id).await?
            }
            WishlistMutation::Clear => self.api.clear_wishlist().await?,
        };
        Ok(Some(items))
    }

    async fn discard(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockCommerceApi;
    use crate::adapters::storage::InMemoryLocalStore;
    use rust_decimal::Decimal;

    fn new_line(product: &str, quantity: u32) -> NewLineItem {
        NewLineItem::new(
            ProductId::new(product).unwrap(),
            product,
            Decimal::from(10),
            quantity,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn local_store_persists_and_loads_snapshot() {
        let backing = Arc::new(InMemoryLocalStore::new());
        let store = LocalOnlyStore::new(backing.clone(), "cart");
        let line = new_line("a", 2).into_line(ItemId::guest());

        CartStore::persist(&store, &[line.clone()]).await.unwrap();
        let loaded = CartStore::load(&store).await.unwrap();

        assert_eq!(loaded, vec![line]);
        assert_eq!(CartStore::mode(&store), SessionMode::Guest);
    }

    #[tokio::test]
    async fn local_store_never_reconciles() {
        let store = LocalOnlyStore::new(Arc::new(InMemoryLocalStore::new()), "cart");
        let result = CartStore::forward(&store, &CartMutation::Clear).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn remote_store_resolves_guest_ids_by_sku() {
        let api = Arc::new(MockCommerceApi::new());
        let server = api.add_cart_item(&new_line("a", 1)).await.unwrap();
        let store = RemoteBackedStore::new(api.clone());

        let mut local = server[0].clone();
        local.id = ItemId::guest();
        let items = CartStore::forward(
            &store,
            &CartMutation::SetQuantity {
                line: local,
                quantity: 4,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(items[0].quantity, 4);
        assert_eq!(api.call_count("update_cart_item"), 1);
    }

    #[tokio::test]
    async fn remote_store_skips_lines_missing_on_server() {
        let api = Arc::new(MockCommerceApi::new());
        let store = RemoteBackedStore::new(api.clone());
        let line = new_line("ghost", 1).into_line(ItemId::guest());

        let items = CartStore::forward(&store, &CartMutation::Remove(line))
            .await
            .unwrap()
            .unwrap();

        assert!(items.is_empty());
        assert!(!api.was_called("remove_cart_item"));
    }
}
