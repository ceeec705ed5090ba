//! Cart aggregate.
//!
//! Owns the ordered list of line items. Totals and counts are always derived
//! from `items`; nothing else in the crate computes them.
//!
//! # Invariants
//!
//! - No two lines share the same `(product_id, variant)` pair
//! - Every line has `quantity >= 1`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ItemId, ProductId, StateMachine, SyncState, ValidationError};

use super::{LineItem, NewLineItem, VariantKey};

/// What an `add` did to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAdd {
    /// A new row was appended.
    Inserted(LineItem),
    /// An existing row for the same SKU grew by `added`.
    Merged { line: LineItem, added: u32 },
}

impl CartAdd {
    /// The row after the change.
    pub fn line(&self) -> &LineItem {
        match self {
            CartAdd::Inserted(line) | CartAdd::Merged { line, .. } => line,
        }
    }
}

/// What a `set_quantity` did to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(LineItem),
    Removed(LineItem),
    /// Unknown id; nothing happened.
    Missing,
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
    #[serde(skip)]
    sync_state: SyncState,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cart from a list that may violate the SKU uniqueness rule,
    /// collapsing duplicates by summing quantities and dropping zero rows.
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        cart.replace_items(items);
        cart
    }

    pub fn items(&self) -> &[LineItem] {
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

    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of `unit_price × quantity` over all rows.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Sum of quantities over all rows.
    pub fn count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    pub fn find(&self, id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    pub fn find_by_key(
        &self,
        product_id: &ProductId,
        variant: Option<&VariantKey>,
    ) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|line| line.matches(product_id, variant))
    }

    pub fn contains(&self, product_id: &ProductId, variant: Option<&VariantKey>) -> bool {
        self.find_by_key(product_id, variant).is_some()
    }

    /// `unit_price × quantity` of one row, if present.
    pub fn line_total(&self, id: &ItemId) -> Option<Decimal> {
        self.find(id).map(LineItem::line_total)
    }

    /// Adds units of a SKU, merging into an existing row when one matches.
    ///
    /// The unit price of an existing row is kept; prices are snapshotted at
    /// first add.
    pub fn add(&mut self, request: NewLineItem) -> CartAdd {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.matches(&request.product_id, request.variant.as_ref()))
        {
            existing.quantity = existing.quantity.saturating_add(request.quantity);
            return CartAdd::Merged {
                line: existing.clone(),
                added: request.quantity,
            };
        }

        let line = request.into_line(ItemId::guest());
        self.items.push(line.clone());
        CartAdd::Inserted(line)
    }

    /// Sets the quantity of a row. Zero removes the row; an unknown id is a no-op.
    pub fn set_quantity(&mut self, id: &ItemId, quantity: u32) -> QuantityChange {
        if quantity == 0 {
            return match self.remove(id) {
                Some(line) => QuantityChange::Removed(line),
                None => QuantityChange::Missing,
            };
        }

        match self.items.iter_mut().find(|line| &line.id == id) {
            Some(line) => {
                line.quantity = quantity;
                QuantityChange::Updated(line.clone())
            }
            None => QuantityChange::Missing,
        }
    }

    /// Removes a row, returning it if it existed.
    pub fn remove(&mut self, id: &ItemId) -> Option<LineItem> {
        let index = self.items.iter().position(|line| &line.id == id)?;
        Some(self.items.remove(index))
    }

    /// Empties the cart, returning the removed rows.
    pub fn clear(&mut self) -> Vec<LineItem> {
        std::mem::take(&mut self.items)
    }

    /// Overwrites the rows with an authoritative list.
    pub fn replace_items(&mut self, items: Vec<LineItem>) {
        let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
        for item in items.into_iter().filter(|item| item.quantity > 0) {
            match merged
                .iter_mut()
                .find(|line| line.matches(&item.product_id, item.variant.as_ref()))
            {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => merged.push(item),
            }
        }
        self.items = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str) -> ProductId {
        ProductId::new(id).unwrap()
    }

    fn shirt(quantity: u32) -> NewLineItem {
        NewLineItem::new(product("shirt"), "Linen Shirt", Decimal::new(2500, 2), quantity).unwrap()
    }

    fn sized(id: &str, size: &str, price: i64, quantity: u32) -> NewLineItem {
        NewLineItem::new(product(id), id, Decimal::from(price), quantity)
            .unwrap()
            .with_variant(VariantKey::from_parts(Some(size.into()), None))
    }

    #[test]
    fn line_total_of_single_row() {
        let mut cart = Cart::new();
        let line = cart.add(shirt(3)).line().clone();

        assert_eq!(cart.line_total(&line.id), Some(Decimal::new(7500, 2)));
        assert_eq!(cart.line_total(&ItemId::new("missing").unwrap()), None);
    }

    #[test]
    fn add_inserts_new_row() {
        let mut cart = Cart::new();
        let outcome = cart.add(shirt(2));

        assert!(matches!(outcome, CartAdd::Inserted(_)));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), Decimal::from(50));
        assert!(outcome.line().id.is_guest());
    }

    #[test]
    fn add_same_sku_merges_quantity() {
        let mut cart = Cart::new();
        let first = cart.add(shirt(1));
        let second = cart.add(shirt(3));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 4);
        assert_eq!(first.line().id, second.line().id);
        assert!(matches!(second, CartAdd::Merged { added: 3, .. }));
    }

    #[test]
    fn different_variants_are_separate_rows() {
        let mut cart = Cart::new();
        cart.add(sized("tee", "M", 10, 1));
        cart.add(sized("tee", "L", 10, 1));
        cart.add(sized("tee", "M", 10, 2));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.count(), 4);
    }

    #[test]
    fn merge_keeps_original_price_snapshot() {
        let mut cart = Cart::new();
        cart.add(sized("tee", "M", 10, 1));
        cart.add(sized("tee", "M", 99, 1));

        assert_eq!(cart.items()[0].unit_price, Decimal::from(10));
        assert_eq!(cart.total(), Decimal::from(20));
    }

    #[test]
    fn set_quantity_updates_in_place() {
        let mut cart = Cart::new();
        let id = cart.add(shirt(1)).line().id.clone();

        let change = cart.set_quantity(&id, 5);

        assert!(matches!(change, QuantityChange::Updated(ref line) if line.quantity == 5));
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn set_quantity_zero_equals_remove() {
        let mut a = Cart::new();
        a.add(sized("a", "M", 3, 2));
        let id = a.add(sized("b", "S", 4, 1)).line().id.clone();
        let mut b = a.clone();

        assert!(matches!(a.set_quantity(&id, 0), QuantityChange::Removed(_)));
        assert!(b.remove(&id).is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn set_quantity_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(shirt(1));
        let before = cart.clone();

        let change = cart.set_quantity(&ItemId::new("ghost").unwrap(), 7);

        assert_eq!(change, QuantityChange::Missing);
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(shirt(1));
        assert!(cart.remove(&ItemId::new("ghost").unwrap()).is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn clear_empties_and_returns_rows() {
        let mut cart = Cart::new();
        cart.add(shirt(1));
        cart.add(sized("tee", "M", 10, 1));

        let removed = cart.clear();

        assert_eq!(removed.len(), 2);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn replace_items_collapses_duplicate_skus() {
        let line = |id: &str, qty: u32| LineItem {
            id: ItemId::new(id).unwrap(),
            product_id: product("p"),
            variant: None,
            unit_price: Decimal::ONE,
            quantity: qty,
            display_name: "P".into(),
            image_url: None,
        };
        let cart = Cart::from_items(vec![line("1", 2), line("2", 3), line("3", 0)]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[0].id.as_str(), "1");
    }

    #[test]
    fn sync_state_is_not_serialized() {
        let mut cart = Cart::new();
        cart.set_sync_state(SyncState::Error);
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sync_state(), SyncState::Guest);
    }

    proptest! {
        #[test]
        fn repeated_adds_sum_into_one_row(quantities in proptest::collection::vec(1u32..50, 1..20)) {
            let mut cart = Cart::new();
            for qty in &quantities {
                cart.add(sized("tee", "M", 7, *qty));
            }
            prop_assert_eq!(cart.len(), 1);
            prop_assert_eq!(cart.items()[0].quantity, quantities.iter().sum::<u32>());
        }

        #[test]
        fn total_always_matches_recomputation(
            ops in proptest::collection::vec((0usize..4, 0u32..6, 1i64..500), 1..40)
        ) {
            let skus = ["a", "b", "c", "d"];
            let mut cart = Cart::new();
            for (sku, qty, price) in ops {
                if qty == 0 {
                    if let Some(id) = cart.items().first().map(|l| l.id.clone()) {
                        cart.set_quantity(&id, 0);
                    }
                } else {
                    cart.add(sized(skus[sku], "M", price, qty));
                }
                let expected: Decimal = cart
                    .items()
                    .iter()
                    .map(|l| l.unit_price * Decimal::from(l.quantity))
                    .sum();
                prop_assert_eq!(cart.total(), expected);
                prop_assert_eq!(cart.count(), cart.items().iter().map(|l| l.quantity).sum::<u32>());
            }
        }
    }
}
