//! Guest to signed-in migration bookkeeping.
//!
//! Tracks how much of each guest SKU has already been pushed to the server,
//! so a retry after a partial failure never pushes the same units twice.

use std::collections::HashMap;

use crate::domain::cart::VariantKey;
use crate::domain::foundation::ProductId;

pub type SkuKey = (ProductId, Option<VariantKey>);

#[derive(Debug, Default)]
pub struct MigrationLedger {
    pending: bool,
    pushed: HashMap<SkuKey, u32>,
}

impl MigrationLedger {
    /// Migration will run at the next sign-in.
    pub fn armed() -> Self {
        Self {
            pending: true,
            pushed: HashMap::new(),
        }
    }

    /// Nothing to migrate (session started signed in).
    pub fn settled() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Units of `key` still to push out of `quantity`.
    pub fn remaining(&self, key: &SkuKey, quantity: u32) -> u32 {
        quantity.saturating_sub(self.pushed.get(key).copied().unwrap_or(0))
    }

    pub fn record_pushed(&mut self, key: SkuKey, quantity: u32) {
        let pushed = self.pushed.entry(key).or_insert(0);
        *pushed = pushed.saturating_add(quantity);
    }

    /// Units already pushed beyond what the guest now holds, per SKU.
    ///
    /// Non-empty only when the guest lowered or removed lines between an
    /// interrupted migration and its retry.
    pub fn overshoot<F>(&self, held: F) -> Vec<(SkuKey, u32)>
    where
        F: Fn(&SkuKey) -> u32,
    {
        self.pushed
            .iter()
            .filter_map(|(key, pushed)| {
                let held = held(key);
                (*pushed > held).then(|| (key.clone(), pushed - held))
            })
            .collect()
    }

    /// Records units taken back from the server.
    pub fn record_withdrawn(&mut self, key: &SkuKey, quantity: u32) {
        if let Some(pushed) = self.pushed.get_mut(key) {
            *pushed = pushed.saturating_sub(quantity);
            if *pushed == 0 {
                self.pushed.remove(key);
            }
        }
    }

    /// Number of SKUs with units already pushed.
    pub fn pushed_count(&self) -> usize {
        self.pushed.len()
    }

    pub fn complete(&mut self) {
        self.pending = false;
        self.pushed.clear();
    }

    pub fn rearm(&mut self) {
        self.pending = true;
        self.pushed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> SkuKey {
        (ProductId::new(id).unwrap(), None)
    }

    #[test]
    fn remaining_subtracts_pushed_units() {
        let mut ledger = MigrationLedger::armed();
        assert_eq!(ledger.remaining(&key("a"), 2), 2);

        ledger.record_pushed(key("a"), 2);

        assert_eq!(ledger.remaining(&key("a"), 2), 0);
        assert_eq!(ledger.remaining(&key("a"), 5), 3);
        assert_eq!(ledger.remaining(&key("b"), 1), 1);
    }

    #[test]
    fn overshoot_reports_units_the_guest_no_longer_holds() {
        let mut ledger = MigrationLedger::armed();
        ledger.record_pushed(key("a"), 3);
        ledger.record_pushed(key("b"), 1);

        let held = |k: &SkuKey| if k == &key("a") { 1 } else { 0 };
        let mut excess = ledger.overshoot(held);
        excess.sort_by(|x, y| x.0 .0.as_str().cmp(y.0 .0.as_str()));

        assert_eq!(excess, vec![(key("a"), 2), (key("b"), 1)]);

        ledger.record_withdrawn(&key("a"), 2);
        ledger.record_withdrawn(&key("b"), 1);
        assert!(ledger.overshoot(held).is_empty());
        assert_eq!(ledger.pushed_count(), 1);
    }

    #[test]
    fn complete_and_rearm() {
        let mut ledger = MigrationLedger::armed();
        ledger.record_pushed(key("a"), 1);

        ledger.complete();
        assert!(!ledger.is_pending());
        assert_eq!(ledger.pushed_count(), 0);

        ledger.rearm();
        assert!(ledger.is_pending());
        assert!(!MigrationLedger::settled().is_pending());
    }
}
