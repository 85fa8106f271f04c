//! Per-run inventory bookkeeping (§4.3, C3).
//!
//! Owned by exactly one planning run; never shared across concurrent runs
//! (§5). Packs are committed to the ledger in pack order; there is no
//! `release` — a run either completes or is discarded wholesale.

use std::collections::HashMap;

use crate::domain::Stockyard;

pub struct InventoryLedger {
    // stockyard code -> product code -> tonnes remaining
    remaining: HashMap<String, HashMap<String, f64>>,
}

impl InventoryLedger {
    pub fn from_snapshot(stockyards: &[Stockyard]) -> Self {
        let remaining = stockyards
            .iter()
            .map(|sy| (sy.code.clone(), sy.current_inventory.clone()))
            .collect();

        Self { remaining }
    }

    pub fn have(&self, stockyard_code: &str, product_code: &str, quantity_tonnes: f64) -> bool {
        self.remaining
            .get(stockyard_code)
            .and_then(|products| products.get(product_code))
            .is_some_and(|&available| available >= quantity_tonnes)
    }

    /// Decrements remaining tonnage. Must be preceded by a successful
    /// `have` check for the same stockyard/product/quantity — this is an
    /// internal invariant of a single-owned ledger, not a runtime-checked
    /// error path.
    pub fn reserve(&mut self, stockyard_code: &str, product_code: &str, quantity_tonnes: f64) {
        debug_assert!(
            self.have(stockyard_code, product_code, quantity_tonnes),
            "reserve called without a prior have() check"
        );

        if let Some(products) = self.remaining.get_mut(stockyard_code) {
            if let Some(amount) = products.get_mut(product_code) {
                *amount -= quantity_tonnes;
            }
        }
    }

    pub fn remaining_of(&self, stockyard_code: &str, product_code: &str) -> f64 {
        self.remaining
            .get(stockyard_code)
            .and_then(|products| products.get(product_code))
            .copied()
            .unwrap_or(0.0)
    }
}
