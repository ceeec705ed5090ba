//! WishlistSync - coordinator for the wishlist aggregate.
//!
//! Same contract as the cart coordinator, without quantities: saving an
//! already-saved product is a no-op and removals act on the whole product.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::foundation::{ItemId, ProductId, SessionMode, SyncState};
use crate::domain::notification::Notification;
use crate::domain::wishlist::{NewSavedItem, SavedItem, Wishlist, WishlistToggle};
use crate::ports::{LocalStore, NotificationSink, WishlistApi};

use super::clock::{MutationClock, MutationTicket};
use super::migration::MigrationLedger;
use super::store::{LocalOnlyStore, RemoteBackedStore, WishlistMutation, WishlistStore};
use super::SyncError;

const SYNC_FAILED: &str = "Failed to sync wishlist";

struct WishlistState {
    wishlist: Wishlist,
    clock: MutationClock,
    active: Arc<dyn WishlistStore>,
    migration: MigrationLedger,
}

impl WishlistState {
    fn mark(&mut self, target: SyncState) {
        if let Err(e) = self.wishlist.transition_sync_state(target) {
            warn!(error = %e, "Ignoring wishlist sync state change");
        }
    }
}

/// Wishlist coordinator for one session.
pub struct WishlistSync {
    state: Mutex<WishlistState>,
    local: Arc<dyn WishlistStore>,
    remote: Arc<dyn WishlistStore>,
    sink: Arc<dyn NotificationSink>,
}

impl WishlistSync {
    pub fn new(
        local: Arc<dyn WishlistStore>,
        remote: Arc<dyn WishlistStore>,
        sink: Arc<dyn NotificationSink>,
        mode: SessionMode,
    ) -> Self {
        let mut wishlist = Wishlist::new();
        let (active, migration) = if mode.is_authenticated() {
            wishlist.set_sync_state(SyncState::Synced);
            (Arc::clone(&remote), MigrationLedger::settled())
        } else {
            (Arc::clone(&local), MigrationLedger::armed())
        };

        Self {
            state: Mutex::new(WishlistState {
                wishlist,
                clock: MutationClock::new(),
                active,
                migration,
            }),
            local,
            remote,
            sink,
        }
    }

    pub fn with_ports(
        store: Arc<dyn LocalStore>,
        key: impl Into<String>,
        api: Arc<dyn WishlistApi>,
        sink: Arc<dyn NotificationSink>,
        mode: SessionMode,
    ) -> Self {
        Self::new(
            Arc::new(LocalOnlyStore::new(store, key)),
            Arc::new(RemoteBackedStore::new(api)),
            sink,
            mode,
        )
    }

    pub async fn snapshot(&self) -> Wishlist {
        self.state.lock().await.wishlist.clone()
    }

    pub async fn items(&self) -> Vec<SavedItem> {
        self.state.lock().await.wishlist.items().to_vec()
    }

    pub async fn count(&self) -> usize {
        self.state.lock().await.wishlist.count()
    }

    pub async fn contains(&self, product_id: &ProductId) -> bool {
        self.state.lock().await.wishlist.contains(product_id)
    }

    pub async fn sync_state(&self) -> SyncState {
        self.state.lock().await.wishlist.sync_state()
    }

    pub async fn mode(&self) -> SessionMode {
        self.state.lock().await.active.mode()
    }

    pub async fn migration_pending(&self) -> bool {
        self.state.lock().await.migration.is_pending()
    }

    /// Loads the starting state from the active store.
    pub async fn hydrate(&self) -> Result<Wishlist, SyncError> {
        self.load_from_active().await
    }

    /// Re-fetches the server wishlist. A no-op while signed out.
    pub async fn refresh(&self) -> Result<Wishlist, SyncError> {
        if !self.mode().await.is_authenticated() {
            return Ok(self.snapshot().await);
        }
        self.load_from_active().await
    }

    async fn load_from_active(&self) -> Result<Wishlist, SyncError> {
        let (ticket, store) = {
            let mut state = self.state.lock().await;
            if state.active.mode().is_authenticated() {
                state.mark(SyncState::Syncing);
            }
            (state.clock.current(), Arc::clone(&state.active))
        };

        let loaded = store.load().await;

        let mut state = self.state.lock().await;
        if !state.clock.is_latest(ticket) {
            debug!(seq = ticket.seq(), "Discarding wishlist load superseded by a local change");
            return Ok(state.wishlist.clone());
        }

        match loaded {
            Ok(items) => {
                state.wishlist.replace_items(items);
                if store.mode().is_authenticated() {
                    state.mark(SyncState::Synced);
                }
                Ok(state.wishlist.clone())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load wishlist; keeping local state");
                state.mark(SyncState::Error);
                drop(state);
                self.sink
                    .publish(Notification::error(SYNC_FAILED).with_message(e.to_string()));
                Err(e)
            }
        }
    }

    /// Saves a product. Already-saved products are left alone.
    pub async fn add(&self, request: NewSavedItem) -> Result<Wishlist, SyncError> {
        let (ticket, store) = {
            let mut state = self.state.lock().await;
            if state.wishlist.add(request.clone()).is_none() {
                debug!(product_id = %request.product_id, "Product already in wishlist");
                return Ok(state.wishlist.clone());
            }
            self.commit_local(&mut state).await
        };

        self.sink.publish(Notification::success(format!(
            "{} added to wishlist",
            request.display_name
        )));
        self.forward(ticket, store, WishlistMutation::Add(request)).await
    }

    /// Removes the entry with `id`, along with any other entry for the same
    /// product, since the server keys saved items by product.
    pub async fn remove(&self, id: &ItemId) -> Result<Wishlist, SyncError> {
        let product_id = {
            let state = self.state.lock().await;
            match state.wishlist.find(id) {
                Some(item) => item.product_id.clone(),
                None => {
                    debug!(item_id = %id, "Ignoring removal of unknown wishlist entry");
                    return Ok(state.wishlist.clone());
                }
            }
        };
        self.remove_product(&product_id).await
    }

    /// Removes every entry for a product; absent products are a no-op.
    pub async fn remove_product(&self, product_id: &ProductId) -> Result<Wishlist, SyncError> {
        let (ticket, store, removed) = {
            let mut state = self.state.lock().await;
            let removed = state.wishlist.remove_product(product_id);
            if removed.is_empty() {
                return Ok(state.wishlist.clone());
            }
            let (ticket, store) = self.commit_local(&mut state).await;
            (ticket, store, removed)
        };

        if let Some(first) = removed.first() {
            self.sink.publish(Notification::info(format!(
                "{} removed from wishlist",
                first.display_name
            )));
        }
        self.forward(
            ticket,
            store,
            WishlistMutation::RemoveProduct(product_id.clone()),
        )
        .await
    }

    /// Saves the product when absent, removes it when present.
    pub async fn toggle(&self, request: NewSavedItem) -> Result<Wishlist, SyncError> {
        let (ticket, store, toggled) = {
            let mut state = self.state.lock().await;
            let toggled = state.wishlist.toggle(request.clone());
            let (ticket, store) = self.commit_local(&mut state).await;
            (ticket, store, toggled)
        };

        let mutation = match toggled {
            WishlistToggle::Added(_) => {
                self.sink.publish(Notification::success(format!(
                    "{} added to wishlist",
                    request.display_name
                )));
                WishlistMutation::Add(request)
            }
            WishlistToggle::Removed(_) => {
                self.sink.publish(Notification::info(format!(
                    "{} removed from wishlist",
                    request.display_name
                )));
                WishlistMutation::RemoveProduct(request.product_id)
            }
        };
        self.forward(ticket, store, mutation).await
    }

    pub async fn clear(&self) -> Result<Wishlist, SyncError> {
        let (ticket, store) = {
            let mut state = self.state.lock().await;
            state.wishlist.clear();
            self.commit_local(&mut state).await
        };
        self.forward(ticket, store, WishlistMutation::Clear).await
    }

    async fn commit_local(
        &self,
        state: &mut WishlistState,
    ) -> (MutationTicket, Arc<dyn WishlistStore>) {
        let ticket = state.clock.next();
        let store = Arc::clone(&state.active);
        if store.mode().is_authenticated() {
            state.mark(SyncState::Syncing);
        }
        if let Err(e) = store.persist(state.wishlist.items()).await {
            warn!(error = %e, "Failed to persist wishlist snapshot");
        }
        (ticket, store)
    }

    async fn forward(
        &self,
        ticket: MutationTicket,
        store: Arc<dyn WishlistStore>,
        mutation: WishlistMutation,
    ) -> Result<Wishlist, SyncError> {
        let result = store.forward(&mutation).await;

        let mut state = self.state.lock().await;
        if !state.clock.same_epoch(ticket) {
            debug!(seq = ticket.seq(), "Discarding wishlist response from a previous session");
            return Ok(state.wishlist.clone());
        }

        match result {
            Ok(None) => Ok(state.wishlist.clone()),
            Ok(Some(items)) if state.clock.is_latest(ticket) => {
                state.wishlist.replace_items(items);
                state.mark(SyncState::Synced);
                Ok(state.wishlist.clone())
            }
            Ok(Some(_)) => {
                debug!(
                    seq = ticket.seq(),
                    latest = state.clock.latest_seq(),
                    "Discarding stale wishlist reconciliation"
                );
                Ok(state.wishlist.clone())
            }
            Err(e) => {
                warn!(seq = ticket.seq(), error = %e, "Wishlist sync failed; keeping local state");
                state.mark(SyncState::Error);
                let wishlist = state.wishlist.clone();
                drop(state);

                self.sink
                    .publish(Notification::error(SYNC_FAILED).with_message(e.to_string()));
                if e.is_unauthorized() {
                    return Err(SyncError::Remote(e));
                }
                Ok(wishlist)
            }
        }
    }

    /// Unions the guest wishlist into the server wishlist, once per sign-in.
    ///
    /// # Errors
    ///
    /// `MigrationIncomplete` if a push fails; saved products already pushed
    /// are skipped on retry.
    pub async fn sign_in(&self) -> Result<Wishlist, SyncError> {
        let mut state = self.state.lock().await;
        if !state.migration.is_pending() {
            return Ok(state.wishlist.clone());
        }

        state.mark(SyncState::Syncing);
        let guest_items = state.wishlist.items().to_vec();

        if let Err(e) = self.withdraw_removed(&mut state.migration, &guest_items).await {
            warn!(error = %e, "Wishlist migration could not withdraw items removed by the guest");
            state.mark(SyncState::Error);
            drop(state);
            self.sink
                .publish(Notification::error(SYNC_FAILED).with_message(e.to_string()));
            return Err(match e {
                SyncError::Remote(source) => SyncError::MigrationIncomplete {
                    remaining: guest_items.len(),
                    source,
                },
                other => other,
            });
        }

        for (index, item) in guest_items.iter().enumerate() {
            let key = (item.product_id.clone(), item.variant.clone());
            if state.migration.remaining(&key, 1) == 0 {
                continue;
            }

            match self
                .remote
                .forward(&WishlistMutation::Add(NewSavedItem::from(item)))
                .await
            {
                Ok(_) => state.migration.record_pushed(key, 1),
                Err(e) => {
                    let pending = guest_items.len() - index;
                    warn!(product_id = %item.product_id, pending, error = %e, "Wishlist migration interrupted");
                    state.mark(SyncState::Error);
                    drop(state);
                    self.sink
                        .publish(Notification::error(SYNC_FAILED).with_message(e.to_string()));
                    return Err(SyncError::MigrationIncomplete {
                        remaining: pending,
                        source: e,
                    });
                }
            }
        }

        let canonical = match self.remote.load().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist after migration");
                state.mark(SyncState::Error);
                drop(state);
                self.sink
                    .publish(Notification::error(SYNC_FAILED).with_message(e.to_string()));
                return Err(e);
            }
        };

        state.wishlist.replace_items(canonical);
        if let Err(e) = self.local.discard().await {
            warn!(error = %e, "Failed to drop guest wishlist snapshot");
        }
        state.active = Arc::clone(&self.remote);
        state.clock.new_epoch();
        state.migration.complete();
        state.mark(SyncState::Synced);

        info!(
            guest_items = guest_items.len(),
            items = state.wishlist.count(),
            "Wishlist migration complete"
        );
        Ok(state.wishlist.clone())
    }

    /// Removes from the server the products an interrupted migration pushed
    /// that the guest has since unsaved.
    async fn withdraw_removed(
        &self,
        migration: &mut MigrationLedger,
        guest_items: &[SavedItem],
    ) -> Result<(), SyncError> {
        let excess = migration.overshoot(|(product_id, variant)| {
            u32::from(
                guest_items
                    .iter()
                    .any(|item| item.matches(product_id, variant.as_ref())),
            )
        });
        if excess.is_empty() {
            return Ok(());
        }

        let server = self.remote.load().await?;
        for (key, units) in excess {
            let (product_id, _) = &key;
            if server.iter().any(|saved| &saved.product_id == product_id) {
                self.remote
                    .forward(&WishlistMutation::RemoveProduct(product_id.clone()))
                    .await?;
                debug!(product_id = %product_id, "Withdrew migrated wishlist item");
            }
            migration.record_withdrawn(&key, units);
        }
        Ok(())
    }

    /// Returns to guest mode with an empty wishlist and re-arms migration.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        state.wishlist.clear();
        state.active = Arc::clone(&self.local);
        state.clock.new_epoch();
        state.migration.rearm();
        state.mark(SyncState::Guest);

        if let Err(e) = state.active.persist(state.wishlist.items()).await {
            warn!(error = %e, "Failed to persist empty guest wishlist");
        }
        info!("Wishlist reset to guest mode");
    }
}
