//! Mock storefront backend for testing.
//!
//! Provides an in-memory implementation of `CartApi`, `WishlistApi` and
//! `PaymentGateway` with server semantics (adds sum quantities, ids are
//! assigned by the "server"). Supports:
//! - Seeded server state
//! - Error injection, globally, per method, or on the n-th call of a method
//! - Call tracking
//! - Call gates that hold a response until the test releases it
//! - Scripted payment status sequences

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::cart::{LineItem, NewLineItem};
use crate::domain::foundation::{ItemId, ProductId, Timestamp, TransactionId};
use crate::domain::wishlist::{NewSavedItem, SavedItem};
use crate::ports::{
    ApiError, CartApi, InitiationRequest, InitiationResponse, PaymentGateway,
    PaymentStatusReport, WishlistApi,
};

/// Mock backend for testing.
///
/// # Example
///
/// ```ignore
/// let api = MockCommerceApi::new();
///
/// // Seed the server cart
/// api.seed_cart(vec![line("A", 3)]);
///
/// // Inject errors
/// api.set_method_error("add_cart_item", ApiError::network("offline"));
///
/// // Script payment polling
/// api.push_statuses("pending", 29);
/// api.push_status(PaymentStatusReport::new("successful"));
/// ```
#[derive(Default, Clone)]
pub struct MockCommerceApi {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Server-side cart.
    cart: Vec<LineItem>,

    /// Server-side wishlist.
    wishlist: Vec<SavedItem>,

    /// Counter for server-assigned ids.
    next_id: u64,

    /// Response to the next initiation call.
    next_initiation: Option<Result<InitiationResponse, ApiError>>,

    /// Status responses returned in order; `pending` once exhausted.
    status_script: VecDeque<Result<PaymentStatusReport, ApiError>>,

    /// Error to return on next call (consumed).
    next_error: Option<ApiError>,

    /// Errors returned by every call of a method.
    method_errors: HashMap<String, ApiError>,

    /// Errors returned by one specific call (1-based) of a method.
    call_errors: HashMap<(String, usize), ApiError>,

    /// One-shot gates keyed by method.
    gates: HashMap<String, CallGate>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// Holds one call of a method after the server has computed its response.
///
/// The gated call signals `entered` and then waits for `release` before
/// returning, which lets a test interleave other calls with an in-flight one.
#[derive(Debug, Clone, Default)]
pub struct CallGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl CallGate {
    /// Wait until the gated call is parked.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated call return.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn park(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

impl MockCommerceApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Server State
    // ════════════════════════════════════════════════════════════════════════════

    /// Replace the server cart.
    pub fn seed_cart(&self, items: Vec<LineItem>) {
        self.state().cart = items;
    }

    /// Current server cart.
    pub fn cart_items(&self) -> Vec<LineItem> {
        self.state().cart.clone()
    }

    /// Replace the server wishlist.
    pub fn seed_wishlist(&self, items: Vec<SavedItem>) {
        self.state().wishlist = items;
    }

    /// Current server wishlist.
    pub fn wishlist_items(&self) -> Vec<SavedItem> {
        self.state().wishlist.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payment Script
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the response to the next initiation call.
    pub fn set_initiation(&self, response: Result<InitiationResponse, ApiError>) {
        self.state().next_initiation = Some(response);
    }

    /// Append one status response.
    pub fn push_status(&self, report: PaymentStatusReport) {
        self.state().status_script.push_back(Ok(report));
    }

    /// Append `count` responses with the same status.
    pub fn push_statuses(&self, status: &str, count: usize) {
        let mut state = self.state();
        for _ in 0..count {
            state
                .status_script
                .push_back(Ok(PaymentStatusReport::new(status)));
        }
    }

    /// Append a failed status check.
    pub fn push_status_error(&self, error: ApiError) {
        self.state().status_script.push_back(Err(error));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Injection
    // ════════════════════════════════════════════════════════════════════════════

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: ApiError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for every call to a method.
    pub fn set_method_error(&self, method: &str, error: ApiError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Fail only the `call`-th (1-based) call to a method.
    pub fn set_error_on_call(&self, method: &str, call: usize, error: ApiError) {
        self.state()
            .call_errors
            .insert((method.to_string(), call), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
        state.call_errors.clear();
    }

    /// Hold the next call to `method` until the returned gate is released.
    pub fn gate(&self, method: &str) -> CallGate {
        let gate = CallGate::default();
        self.state().gates.insert(method.to_string(), gate.clone());
        gate
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Total number of calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.state().call_log.len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    /// Records the call and returns any error configured for it.
    fn begin(&self, method: &str, args: Vec<String>) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        let nth = state
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count();

        if let Some(error) = state.call_errors.remove(&(method.to_string(), nth)) {
            return Err(error);
        }
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }

    /// Parks the caller if a gate is set for `method`.
    async fn pass_gate(&self, method: &str) {
        let gate = self.state().gates.remove(method);
        if let Some(gate) = gate {
            gate.park().await;
        }
    }

    async fn finish<T>(&self, method: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.pass_gate(method).await;
        result
    }

    fn server_id(state: &mut MockState) -> Result<ItemId, ApiError> {
        state.next_id += 1;
        ItemId::new(format!("srv-{}", state.next_id)).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::rejected(404, format!("{} not found", what))
    }
}

#[async_trait]
impl CartApi for MockCommerceApi {
    async fn fetch_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        self.begin("fetch_cart", vec![])?;
        let items = self.cart_items();
        self.finish("fetch_cart", Ok(items)).await
    }

    async fn add_cart_item(&self, item: &NewLineItem) -> Result<Vec<LineItem>, ApiError> {
        self.begin(
            "add_cart_item",
            vec![item.product_id.to_string(), item.quantity.to_string()],
        )?;

        let result = {
            let mut state = self.state();
            let existing = state
                .cart
                .iter()
                .position(|line| line.matches(&item.product_id, item.variant.as_ref()));
            match existing {
                Some(index) => {
                    let line = &mut state.cart[index];
                    line.quantity = line.quantity.saturating_add(item.quantity);
                    Ok(state.cart.clone())
                }
                None => Self::server_id(&mut state).map(|id| {
                    state.cart.push(item.clone().into_line(id));
                    state.cart.clone()
                }),
            }
        };

        self.finish("add_cart_item", result).await
    }

    async fn update_cart_item(
        &self,
        id: &ItemId,
        quantity: u32,
    ) -> Result<Vec<LineItem>, ApiError> {
        self.begin("update_cart_item", vec![id.to_string(), quantity.to_string()])?;

        let result = {
            let mut state = self.state();
            match state.cart.iter().position(|line| &line.id == id) {
                Some(index) if quantity == 0 => {
                    state.cart.remove(index);
                    Ok(state.cart.clone())
                }
                Some(index) => {
                    state.cart[index].quantity = quantity;
                    Ok(state.cart.clone())
                }
                None => Err(Self::not_found("Cart item")),
            }
        };

        self.finish("update_cart_item", result).await
    }

    async fn remove_cart_item(&self, id: &ItemId) -> Result<Vec<LineItem>, ApiError> {
        self.begin("remove_cart_item", vec![id.to_string()])?;

        let result = {
            let mut state = self.state();
            match state.cart.iter().position(|line| &line.id == id) {
                Some(index) => {
                    state.cart.remove(index);
                    Ok(state.cart.clone())
                }
                None => Err(Self::not_found("Cart item")),
            }
        };

        self.finish("remove_cart_item", result).await
    }

    async fn clear_cart(&self) -> Result<Vec<LineItem>, ApiError> {
        self.begin("clear_cart", vec![])?;
        self.state().cart.clear();
        self.finish("clear_cart", Ok(Vec::new())).await
    }
}

#[async_trait]
impl WishlistApi for MockCommerceApi {
    async fn fetch_wishlist(&self) -> Result<Vec<SavedItem>, ApiError> {
        self.begin("fetch_wishlist", vec![])?;
        let items = self.wishlist_items();
        self.finish("fetch_wishlist", Ok(items)).await
    }

    async fn add_wishlist_item(&self, item: &NewSavedItem) -> Result<Vec<SavedItem>, ApiError> {
        self.begin("add_wishlist_item", vec![item.product_id.to_string()])?;

        let result = {
            let mut state = self.state();
            let present = state
                .wishlist
                .iter()
                .any(|saved| saved.matches(&item.product_id, item.variant.as_ref()));
            if present {
                Ok(state.wishlist.clone())
            } else {
                Self::server_id(&mut state).map(|id| {
                    state
                        .wishlist
                        .push(item.clone().into_saved(id, Timestamp::now()));
                    state.wishlist.clone()
                })
            }
        };

        self.finish("add_wishlist_item", result).await
    }

    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<SavedItem>, ApiError> {
        self.begin("remove_wishlist_item", vec![product_id.to_string()])?;

        let result = {
            let mut state = self.state();
            let before = state.wishlist.len();
            state.wishlist.retain(|saved| &saved.product_id != product_id);
            if state.wishlist.len() == before {
                Err(Self::not_found("Wishlist item"))
            } else {
                Ok(state.wishlist.clone())
            }
        };

        self.finish("remove_wishlist_item", result).await
    }

    async fn clear_wishlist(&self) -> Result<Vec<SavedItem>, ApiError> {
        self.begin("clear_wishlist", vec![])?;
        self.state().wishlist.clear();
        self.finish("clear_wishlist", Ok(Vec::new())).await
    }
}

#[async_trait]
impl PaymentGateway for MockCommerceApi {
    async fn initiate_push(
        &self,
        request: &InitiationRequest,
    ) -> Result<InitiationResponse, ApiError> {
        self.begin(
            "initiate_push",
            vec![
                request.phone_number.to_string(),
                request.order_id.to_string(),
                request.amount.to_string(),
            ],
        )?;

        let result = {
            let mut state = self.state();
            match state.next_initiation.take() {
                Some(response) => response,
                None => {
                    state.next_id += 1;
                    TransactionId::new(format!("ws_CO_mock_{}", state.next_id))
                        .map(InitiationResponse::accepted)
                        .map_err(|e| ApiError::Decode(e.to_string()))
                }
            }
        };

        self.finish("initiate_push", result).await
    }

    async fn transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentStatusReport, ApiError> {
        self.begin("transaction_status", vec![transaction_id.to_string()])?;

        let result = self
            .state()
            .status_script
            .pop_front()
            .unwrap_or_else(|| Ok(PaymentStatusReport::new("pending")));

        self.finish("transaction_status", result).await
    }
}
