//! CartSync - coordinator for the cart aggregate.
//!
//! Every operation applies to the local aggregate first, persists through the
//! active store, and only then forwards to the server. The state lock is not
//! held while a forwarded call is in flight; its response is applied only if
//! no newer local mutation happened in the meantime.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::cart::{Cart, LineItem, NewLineItem, QuantityChange};
use crate::domain::foundation::{ItemId, SessionMode, SyncState};
use crate::domain::notification::Notification;
use crate::ports::{CartApi, LocalStore, NotificationSink};

use super::clock::{MutationClock, MutationTicket};
use super::migration::MigrationLedger;
use super::store::{CartMutation, CartStore, LocalOnlyStore, RemoteBackedStore};
use super::SyncError;

struct CartState {
    cart: Cart,
    clock: MutationClock,
    active: Arc<dyn CartStore>,
    migration: MigrationLedger,
}

impl CartState {
    fn mark(&mut self, target: SyncState) {
        if let Err(e) = self.cart.transition_sync_state(target) {
            warn!(error = %e, "Ignoring cart sync state change");
        }
    }
}

/// Cart coordinator for one session.
pub struct CartSync {
    state: Mutex<CartState>,
    local: Arc<dyn CartStore>,
    remote: Arc<dyn CartStore>,
    sink: Arc<dyn NotificationSink>,
}

impl CartSync {
    /// Creates a coordinator starting in `mode`.
    ///
    /// A guest session arms migration for the next sign-in; a session that
    /// starts signed in has nothing to migrate.
    pub fn new(
        local: Arc<dyn CartStore>,
        remote: Arc<dyn CartStore>,
        sink: Arc<dyn NotificationSink>,
        mode: SessionMode,
    ) -> Self {
        let mut cart = Cart::new();
        let (active, migration) = if mode.is_authenticated() {
            cart.set_sync_state(SyncState::Synced);
            (Arc::clone(&remote), MigrationLedger::settled())
        } else {
            (Arc::clone(&local), MigrationLedger::armed())
        };

        Self {
            state: Mutex::new(CartState {
                cart,
                clock: MutationClock::new(),
                active,
                migration,
            }),
            local,
            remote,
            sink,
        }
    }

    /// Wires the stock strategies: a snapshot under `key` while signed out,
    /// `api` while signed in.
    pub fn with_ports(
        store: Arc<dyn LocalStore>,
        key: impl Into<String>,
        api: Arc<dyn CartApi>,
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

    /// Copy of the current cart.
    pub async fn snapshot(&self) -> Cart {
        self.state.lock().await.cart.clone()
    }

    pub async fn items(&self) -> Vec<LineItem> {
        self.state.lock().await.cart.items().to_vec()
    }

    pub async fn total(&self) -> rust_decimal::Decimal {
        self.state.lock().await.cart.total()
    }

    pub async fn count(&self) -> u32 {
        self.state.lock().await.cart.count()
    }

    pub async fn sync_state(&self) -> SyncState {
        self.state.lock().await.cart.sync_state()
    }

    pub async fn mode(&self) -> SessionMode {
        self.state.lock().await.active.mode()
    }

    pub async fn migration_pending(&self) -> bool {
        self.state.lock().await.migration.is_pending()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Loading
    // ════════════════════════════════════════════════════════════════════════════

    /// Loads the starting state from the active store: the guest snapshot, or
    /// the server cart when signed in.
    pub async fn hydrate(&self) -> Result<Cart, SyncError> {
        self.load_from_active().await
    }

    /// Re-fetches the server cart. A no-op while signed out.
    pub async fn refresh(&self) -> Result<Cart, SyncError> {
        if !self.mode().await.is_authenticated() {
            return Ok(self.snapshot().await);
        }
        self.load_from_active().await
    }

    async fn load_from_active(&self) -> Result<Cart, SyncError> {
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
            debug!(seq = ticket.seq(), "Discarding cart load superseded by a local change");
            return Ok(state.cart.clone());
        }

        match loaded {
            Ok(items) => {
                state.cart.replace_items(items);
                if store.mode().is_authenticated() {
                    state.mark(SyncState::Synced);
                }
                debug!(lines = state.cart.len(), mode = ?store.mode(), "Cart loaded");
                Ok(state.cart.clone())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cart; keeping local state");
                state.mark(SyncState::Error);
                drop(state);
                self.sink
                    .publish(Notification::error("Failed to sync cart").with_message(e.to_string()));
                Err(e)
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Mutations
    // ════════════════════════════════════════════════════════════════════════════

    /// Adds units of a SKU, merging into an existing row.
    ///
    /// # Errors
    ///
    /// `Validation` for a zero quantity or negative price; nothing is changed.
    pub async fn add(&self, request: NewLineItem) -> Result<Cart, SyncError> {
        request.validate()?;

        let (ticket, store) = {
            let mut state = self.state.lock().await;
            let outcome = state.cart.add(request.clone());
            debug!(
                item_id = %outcome.line().id,
                product_id = %request.product_id,
                quantity = outcome.line().quantity,
                "Cart line added locally"
            );
            self.commit_local(&mut state).await
        };

        self.sink.publish(Notification::success(format!(
            "{} added to cart",
            request.display_name
        )));
        self.forward(ticket, store, CartMutation::Add(request)).await
    }

    /// Sets a row's quantity. Zero removes the row; unknown ids are a no-op.
    pub async fn set_quantity(&self, id: &ItemId, quantity: u32) -> Result<Cart, SyncError> {
        if quantity == 0 {
            return self.remove(id).await;
        }

        let (ticket, store, line) = {
            let mut state = self.state.lock().await;
            let line = match state.cart.set_quantity(id, quantity) {
                QuantityChange::Updated(line) => line,
                QuantityChange::Removed(_) | QuantityChange::Missing => {
                    debug!(item_id = %id, "Ignoring quantity change for unknown cart line");
                    return Ok(state.cart.clone());
                }
            };
            let (ticket, store) = self.commit_local(&mut state).await;
            (ticket, store, line)
        };

        self.sink.publish(Notification::success(format!(
            "Updated {} quantity",
            line.display_name
        )));
        self.forward(ticket, store, CartMutation::SetQuantity { line, quantity })
            .await
    }

    /// Removes a row; unknown ids are a no-op.
    pub async fn remove(&self, id: &ItemId) -> Result<Cart, SyncError> {
        let (ticket, store, line) = {
            let mut state = self.state.lock().await;
            let Some(line) = state.cart.remove(id) else {
                debug!(item_id = %id, "Ignoring removal of unknown cart line");
                return Ok(state.cart.clone());
            };
            let (ticket, store) = self.commit_local(&mut state).await;
            (ticket, store, line)
        };

        self.sink.publish(Notification::success(format!(
            "Removed {} from cart",
            line.display_name
        )));
        self.forward(ticket, store, CartMutation::Remove(line)).await
    }

    /// Empties the cart, and the server cart when signed in.
    pub async fn clear(&self) -> Result<Cart, SyncError> {
        let (ticket, store) = {
            let mut state = self.state.lock().await;
            let removed = state.cart.clear();
            debug!(lines = removed.len(), "Cart cleared locally");
            self.commit_local(&mut state).await
        };

        self.forward(ticket, store, CartMutation::Clear).await
    }

    /// Takes a ticket for the mutation just applied and persists the result.
    async fn commit_local(&self, state: &mut CartState) -> (MutationTicket, Arc<dyn CartStore>) {
        let ticket = state.clock.next();
        let store = Arc::clone(&state.active);
        if store.mode().is_authenticated() {
            state.mark(SyncState::Syncing);
        }
        if let Err(e) = store.persist(state.cart.items()).await {
            warn!(error = %e, "Failed to persist cart snapshot");
        }
        (ticket, store)
    }

    /// Sends a mutation to the store it was made against and reconciles.
    async fn forward(
        &self,
        ticket: MutationTicket,
        store: Arc<dyn CartStore>,
        mutation: CartMutation,
    ) -> Result<Cart, SyncError> {
        let result = store.forward(&mutation).await;

        let mut state = self.state.lock().await;
        if !state.clock.same_epoch(ticket) {
            debug!(seq = ticket.seq(), "Discarding cart response from a previous session");
            return Ok(state.cart.clone());
        }

        match result {
            Ok(None) => Ok(state.cart.clone()),
            Ok(Some(items)) if state.clock.is_latest(ticket) => {
                state.cart.replace_items(items);
                state.mark(SyncState::Synced);
                debug!(seq = ticket.seq(), lines = state.cart.len(), "Cart reconciled with server");
                Ok(state.cart.clone())
            }
            Ok(Some(_)) => {
                debug!(
                    seq = ticket.seq(),
                    latest = state.clock.latest_seq(),
                    "Discarding stale cart reconciliation"
                );
                Ok(state.cart.clone())
            }
            Err(e) => {
                warn!(seq = ticket.seq(), error = %e, "Cart sync failed; keeping local state");
                state.mark(SyncState::Error);
                let cart = state.cart.clone();
                drop(state);

                self.sink
                    .publish(Notification::error("Failed to sync cart").with_message(e.to_string()));
                if e.is_unauthorized() {
                    return Err(SyncError::Remote(e));
                }
                Ok(cart)
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Session transitions
    // ════════════════════════════════════════════════════════════════════════════

    /// Merges the guest cart into the server cart, once per sign-in.
    ///
    /// Each guest line is pushed as an add, so the server sums it with any
    /// existing quantity of the same SKU. The server's resulting cart becomes
    /// the local cart, the guest snapshot is dropped and the signed-in store
    /// takes over. Calling this again after success does nothing.
    ///
    /// # Errors
    ///
    /// `MigrationIncomplete` if a push fails; lines already pushed are not
    /// pushed again on retry. `Remote` if the final fetch fails.
    pub async fn sign_in(&self) -> Result<Cart, SyncError> {
        let mut state = self.state.lock().await;
        if !state.migration.is_pending() {
            debug!("Cart migration already done for this session");
            return Ok(state.cart.clone());
        }

        state.mark(SyncState::Syncing);
        let guest_lines = state.cart.items().to_vec();

        if let Err(e) = self.withdraw_shrunk(&mut state.migration, &guest_lines).await {
            warn!(error = %e, "Cart migration could not withdraw units removed by the guest");
            state.mark(SyncState::Error);
            drop(state);
            self.sink
                .publish(Notification::error("Failed to sync cart").with_message(e.to_string()));
            return Err(match e {
                SyncError::Remote(source) => SyncError::MigrationIncomplete {
                    remaining: guest_lines.len(),
                    source,
                },
                other => other,
            });
        }

        for (index, line) in guest_lines.iter().enumerate() {
            let key = (line.product_id.clone(), line.variant.clone());
            let remaining = state.migration.remaining(&key, line.quantity);
            if remaining == 0 {
                continue;
            }

            let mut request = NewLineItem::from(line);
            request.quantity = remaining;
            match self.remote.forward(&CartMutation::Add(request)).await {
                Ok(_) => state.migration.record_pushed(key, remaining),
                Err(e) => {
                    let pending = guest_lines.len() - index;
                    warn!(
                        product_id = %line.product_id,
                        pending,
                        error = %e,
                        "Cart migration interrupted"
                    );
                    state.mark(SyncState::Error);
                    drop(state);
                    self.sink.publish(
                        Notification::error("Failed to sync cart").with_message(e.to_string()),
                    );
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
                warn!(error = %e, "Failed to fetch cart after migration");
                state.mark(SyncState::Error);
                drop(state);
                self.sink
                    .publish(Notification::error("Failed to sync cart").with_message(e.to_string()));
                return Err(e);
            }
        };

        state.cart.replace_items(canonical);
        if let Err(e) = self.local.discard().await {
            warn!(error = %e, "Failed to drop guest cart snapshot");
        }
        state.active = Arc::clone(&self.remote);
        state.clock.new_epoch();
        state.migration.complete();
        state.mark(SyncState::Synced);

        info!(
            guest_lines = guest_lines.len(),
            lines = state.cart.len(),
            "Cart migration complete"
        );
        Ok(state.cart.clone())
    }

    /// Takes back units an interrupted migration pushed for lines the guest
    /// has since lowered or removed.
    async fn withdraw_shrunk(
        &self,
        migration: &mut MigrationLedger,
        guest_lines: &[LineItem],
    ) -> Result<(), SyncError> {
        let excess = migration.overshoot(|(product_id, variant)| {
            guest_lines
                .iter()
                .find(|line| line.matches(product_id, variant.as_ref()))
                .map_or(0, |line| line.quantity)
        });
        if excess.is_empty() {
            return Ok(());
        }

        let server = self.remote.load().await?;
        for (key, units) in excess {
            let (product_id, variant) = &key;
            if let Some(line) = server
                .iter()
                .find(|line| line.matches(product_id, variant.as_ref()))
            {
                let left = line.quantity.saturating_sub(units);
                let mutation = if left == 0 {
                    CartMutation::Remove(line.clone())
                } else {
                    CartMutation::SetQuantity {
                        line: line.clone(),
                        quantity: left,
                    }
                };
                self.remote.forward(&mutation).await?;
                debug!(product_id = %product_id, units, left, "Withdrew migrated cart units");
            }
            migration.record_withdrawn(&key, units);
        }
        Ok(())
    }

    /// Returns to guest mode with an empty cart and re-arms migration.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        state.cart.clear();
        state.active = Arc::clone(&self.local);
        state.clock.new_epoch();
        state.migration.rearm();
        state.mark(SyncState::Guest);

        if let Err(e) = state.active.persist(state.cart.items()).await {
            warn!(error = %e, "Failed to persist empty guest cart");
        }
        info!("Cart reset to guest mode");
    }
}
