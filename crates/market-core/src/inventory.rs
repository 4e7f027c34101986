//! # Inventory Ledger
//!
//! Live stock quantities per product code.
//!
//! ## Delta Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve(code, qty)                                                    │
//! │                                                                         │
//! │   qty > 0  → sale decrement   (stock - qty)                            │
//! │   qty < 0  → restock          (stock + |qty|)                          │
//! │                                                                         │
//! │   new stock < 0 ?  → InsufficientStock { available }, ledger untouched│
//! │                                                                         │
//! │  restore(code, qty) = reserve(code, -qty)   (cancel rollback)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads are fail-open: an unknown code simply has zero stock.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Code → quantity map. Quantities are never negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLedger {
    stock: BTreeMap<String, i64>,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        InventoryLedger::default()
    }

    /// Builds a ledger from stored `(code, quantity)` pairs.
    ///
    /// Negative quantities are rejected so a corrupt store cannot break the
    /// non-negative invariant.
    pub fn from_entries<I>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        let mut ledger = InventoryLedger::new();
        for (code, quantity) in entries {
            if quantity < 0 {
                return Err(ValidationError::OutOfRange {
                    field: format!("stock for {}", code),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
            ledger.stock.insert(code, quantity);
        }
        Ok(ledger)
    }

    /// Current quantity for `code`; 0 for unknown codes.
    pub fn quantity_of(&self, code: &str) -> i64 {
        self.stock.get(code).copied().unwrap_or(0)
    }

    /// True if the code has at least one unit in stock.
    pub fn contains(&self, code: &str) -> bool {
        self.quantity_of(code) > 0
    }

    /// Applies a reservation: positive `qty` takes stock out, negative puts
    /// it back.
    ///
    /// ## Returns
    /// The new quantity for `code`.
    ///
    /// ## Errors
    /// - `InsufficientStock` if the result would be negative
    /// - `OutOfRange` if the result would not fit in an `i64`
    ///
    /// The ledger is left unchanged on error.
    pub fn reserve(&mut self, code: &str, qty: i64) -> CoreResult<i64> {
        let current = self.quantity_of(code);
        let Some(updated) = current.checked_sub(qty) else {
            return Err(ValidationError::OutOfRange {
                field: format!("stock for {}", code),
                min: 0,
                max: i64::MAX,
            }
            .into());
        };

        if updated < 0 {
            return Err(CoreError::InsufficientStock {
                code: code.to_string(),
                available: current,
                requested: qty,
            });
        }

        self.stock.insert(code.to_string(), updated);
        debug!(code = %code, delta = -qty, quantity = updated, "Ledger updated");
        Ok(updated)
    }

    /// Puts `qty` units back. Used by cancellation and restocking.
    pub fn restore(&mut self, code: &str, qty: i64) -> CoreResult<i64> {
        match qty.checked_neg() {
            Some(delta) => self.reserve(code, delta),
            None => Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: -i64::MAX,
                max: i64::MAX,
            }
            .into()),
        }
    }

    /// Deletes the entry for `code`, returning its prior quantity (0 if
    /// absent).
    pub fn remove(&mut self, code: &str) -> i64 {
        let removed = self.stock.remove(code).unwrap_or(0);
        debug!(code = %code, removed, "Ledger entry removed");
        removed
    }

    /// Iterates `(code, quantity)` in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.stock.iter().map(|(code, qty)| (code.as_str(), *qty))
    }

    /// Number of codes tracked.
    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    /// Copy of the whole ledger, for reports and persistence.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.stock.clone()
    }
}
