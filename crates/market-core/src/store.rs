//! # Store & Checkout Lanes
//!
//! The single owner of shared state, and the register-level API built on it.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SharedStore = Arc<Mutex<Store>>                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ Store                                                            │  │
//! │  │   catalog     : Catalog          (products)                      │  │
//! │  │   ledger      : InventoryLedger  (shared stock)                  │  │
//! │  │   customers   : CustomerBook     (loyalty + history)             │  │
//! │  │   aggregator  : SalesAggregator  (process lifetime)              │  │
//! │  │   busy        : {CashierId}      (cashiers with an open session) │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │        ▲                  ▲                  ▲                          │
//! │        │ lock per call    │                  │                          │
//! │  CheckoutLane #1    CheckoutLane #2    manager ops / reports            │
//! │  (own CartSession)  (own CartSession)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each lane owns its cart session. Every call that touches stock, loyalty
//! or the aggregator takes the store lock for its whole duration, so
//! mutations from different lanes never interleave.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator::{SalesAggregator, SalesReport};
use crate::catalog::{Catalog, CustomerBook, CustomerDirectory, ProductCatalog};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::InventoryLedger;
use crate::loyalty::Redemption;
use crate::money::Money;
use crate::receipt::Receipt;
use crate::session::{BoundCustomer, CartLine, CartSession, CartTotals};
use crate::types::{CashierId, Customer, Product, SessionState};
use crate::validation::validate_restock_quantity;

// =============================================================================
// Store
// =============================================================================

/// Catalog, stock, customers and sales of one shop.
#[derive(Debug, Clone, Default)]
pub struct Store {
    catalog: Catalog,
    ledger: InventoryLedger,
    customers: CustomerBook,
    aggregator: SalesAggregator,
    busy: BTreeSet<CashierId>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Store::default()
    }

    /// Assembles a store from loaded state. The aggregator starts empty.
    pub fn from_parts(catalog: Catalog, ledger: InventoryLedger, customers: CustomerBook) -> Self {
        Store {
            catalog,
            ledger,
            customers,
            aggregator: SalesAggregator::new(),
            busy: BTreeSet::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn customers(&self) -> &CustomerBook {
        &self.customers
    }

    pub fn aggregator(&self) -> &SalesAggregator {
        &self.aggregator
    }

    /// True if `cashier` has an open session on some lane.
    pub fn is_cashier_busy(&self, cashier: &CashierId) -> bool {
        self.busy.contains(cashier)
    }

    // -------------------------------------------------------------------------
    // Manager operations
    // -------------------------------------------------------------------------

    /// Adds a new product with its opening stock.
    pub fn add_product(&mut self, product: Product, initial_stock: i64) -> CoreResult<()> {
        if initial_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "initial stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let code = product.code().to_string();
        self.catalog.insert(product)?;
        self.ledger.restore(&code, initial_stock)?;
        Ok(())
    }

    /// Registers a loyalty customer.
    pub fn register_customer(&mut self, customer: Customer) -> CoreResult<()> {
        self.customers.register(customer)
    }

    /// Puts `quantity` more units of a catalogued product on the shelf.
    ///
    /// ## Returns
    /// The new quantity.
    pub fn restock(&mut self, code: &str, quantity: i64) -> CoreResult<i64> {
        validate_restock_quantity(quantity)?;
        let code = code.trim();
        if self.catalog.lookup(code).is_none() {
            return Err(CoreError::ProductNotFound(code.to_string()));
        }

        let updated = self.ledger.restore(code, quantity)?;
        info!(code = %code, added = quantity, quantity = updated, "Product restocked");
        Ok(updated)
    }

    pub fn set_weekly_offer(&mut self, code: &str, on_offer: bool) -> CoreResult<()> {
        self.catalog.set_weekly_offer(code.trim(), on_offer)
    }

    pub fn set_base_price(&mut self, code: &str, price: Money) -> CoreResult<()> {
        self.catalog.set_base_price(code.trim(), price)
    }

    /// Removes a product and its ledger entry.
    ///
    /// ## Returns
    /// The stock that was on hand.
    pub fn discontinue(&mut self, code: &str) -> CoreResult<i64> {
        let code = code.trim();
        self.catalog.remove(code)?;
        let removed = self.ledger.remove(code);
        info!(code = %code, removed, "Product discontinued");
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    /// Sales so far, with customer names filled in.
    pub fn sales_report(&self) -> SalesReport {
        let mut report = self.aggregator.report();
        for row in &mut report.customers {
            row.name = self.customers.lookup(&row.phone).map(Customer::full_name);
        }
        report
    }

    /// One row per ledger entry, in code order.
    pub fn inventory_report(&self) -> InventoryReport {
        let rows = self
            .ledger
            .iter()
            .map(|(code, quantity)| {
                let product = self.catalog.lookup(code);
                InventoryRow {
                    code: code.to_string(),
                    name: product.map(|p| p.name().to_string()),
                    category: product.map(|p| p.category().to_string()),
                    quantity,
                }
            })
            .collect();
        InventoryReport { rows }
    }
}

// =============================================================================
// Inventory Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub code: String,
    /// None when the ledger holds stock for a code the catalog no longer has.
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub rows: Vec<InventoryRow>,
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CURRENT INVENTORY:")?;
        if self.rows.is_empty() {
            return write!(f, "\n  No inventory available");
        }
        for row in &self.rows {
            write!(f, "\n  {}: {} units", row.code, row.quantity)?;
            if let (Some(name), Some(category)) = (&row.name, &row.category) {
                write!(f, " ({} - {})", name, category)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Shared Store
// =============================================================================

/// Thread-safe handle to the [`Store`].
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        SharedStore {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Runs `f` with read access to the store.
    pub fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Store) -> R,
    {
        let store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&store)
    }

    /// Runs `f` with write access to the store.
    pub fn with_store_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Store) -> R,
    {
        let mut store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    /// Copy of the whole store, for saving without holding the lock.
    pub fn snapshot(&self) -> Store {
        self.with_store(Store::clone)
    }
}

// =============================================================================
// Checkout Lane
// =============================================================================

/// One register. Runs one cart session at a time against the shared store.
///
/// ## Usage
/// ```rust
/// use market_core::money::Money;
/// use market_core::store::{CheckoutLane, SharedStore, Store};
/// use market_core::types::{CashierId, Product};
///
/// let mut store = Store::new();
/// store
///     .add_product(Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), true).unwrap(), 10)
///     .unwrap();
///
/// let mut lane = CheckoutLane::new(SharedStore::new(store));
/// lane.start_transaction(CashierId::new("C1")).unwrap();
/// lane.add_item("P001", 3).unwrap();
///
/// let receipt = lane.complete_transaction().unwrap();
/// assert_eq!(receipt.final_total.cents(), 2700);
/// ```
#[derive(Debug)]
pub struct CheckoutLane {
    store: SharedStore,
    session: CartSession,
}

impl CheckoutLane {
    pub fn new(store: SharedStore) -> Self {
        CheckoutLane {
            store,
            session: CartSession::new(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The lane's current (or most recent) session.
    pub fn current_session(&self) -> &CartSession {
        &self.session
    }

    /// Opens a new session for `cashier`.
    ///
    /// A lane whose last session finished gets a fresh one. Fails with
    /// `InvalidState` if this lane already has an open session and with
    /// `CashierBusy` if the cashier is serving on another lane.
    pub fn start_transaction(&mut self, cashier: CashierId) -> CoreResult<Uuid> {
        if self.session.state().is_terminal() {
            self.session = CartSession::new();
        }

        let session = &mut self.session;
        self.store.with_store_mut(|store| {
            if session.state() == SessionState::Idle && store.busy.contains(&cashier) {
                warn!(cashier = %cashier, "Cashier already has an open transaction");
                return Err(CoreError::CashierBusy(cashier.to_string()));
            }
            session.start(cashier.clone())?;
            store.busy.insert(cashier);
            Ok(session.id())
        })
    }

    pub fn add_item(&mut self, code: &str, quantity: i64) -> CoreResult<CartLine> {
        let session = &mut self.session;
        self.store.with_store_mut(|store| {
            session
                .add_item(&store.catalog, &mut store.ledger, code, quantity)
                .cloned()
        })
    }

    pub fn set_customer(&mut self, phone: &str) -> CoreResult<BoundCustomer> {
        let session = &mut self.session;
        self.store
            .with_store(|store| session.set_customer(&store.customers, phone).cloned())
    }

    pub fn apply_loyalty_redemption(&mut self, use_points: bool) -> CoreResult<Redemption> {
        let session = &mut self.session;
        self.store.with_store_mut(|store| {
            session.apply_loyalty_redemption(&mut store.customers, use_points)
        })
    }

    /// Settles the session and frees the cashier.
    pub fn complete_transaction(&mut self) -> CoreResult<Receipt> {
        let session = &mut self.session;
        self.store.with_store_mut(|store| {
            let receipt = session.complete(&mut store.customers, &mut store.aggregator)?;
            release_cashier(store, session);
            Ok(receipt)
        })
    }

    /// Rolls the session back and frees the cashier.
    pub fn cancel_transaction(&mut self) -> CoreResult<()> {
        let session = &mut self.session;
        self.store.with_store_mut(|store| {
            session.cancel(&mut store.ledger, &mut store.customers)?;
            release_cashier(store, session);
            Ok(())
        })
    }

    pub fn current_totals(&self) -> CartTotals {
        self.session.totals()
    }
}

impl Drop for CheckoutLane {
    /// A lane closed mid-transaction cancels it, so reserved stock and
    /// redeemed points go back.
    fn drop(&mut self) {
        if self.session.state() == SessionState::Open {
            if let Err(err) = self.cancel_transaction() {
                warn!(error = %err, "Failed to cancel open transaction on lane shutdown");
            }
        }
    }
}

fn release_cashier(store: &mut Store, session: &CartSession) {
    if let Some(cashier) = session.cashier() {
        store.busy.remove(cashier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_store() -> SharedStore {
        let mut store = Store::new();
        store
            .add_product(
                Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), true).unwrap(),
                10,
            )
            .unwrap();
        store
            .add_product(
                Product::new("P002", "Milk", "Dairy", Money::from_cents(250), false).unwrap(),
                2,
            )
            .unwrap();
        store
            .register_customer(
                Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 250, Vec::new())
                    .unwrap(),
            )
            .unwrap();
        SharedStore::new(store)
    }

    #[test]
    fn test_cashier_cannot_open_two_lanes() {
        let store = shared_store();
        let mut lane1 = CheckoutLane::new(store.clone());
        let mut lane2 = CheckoutLane::new(store.clone());

        lane1.start_transaction(CashierId::new("C1")).unwrap();
        assert!(matches!(
            lane2.start_transaction(CashierId::new("C1")),
            Err(CoreError::CashierBusy(_))
        ));
        assert_eq!(lane2.current_session().state(), SessionState::Idle);

        lane2.start_transaction(CashierId::new("C2")).unwrap();
        lane1.cancel_transaction().unwrap();
        assert!(!store.with_store(|s| s.is_cashier_busy(&CashierId::new("C1"))));

        // Lane 1 gets a fresh session after its previous one ended
        lane1.start_transaction(CashierId::new("C1")).unwrap();
        assert_eq!(lane1.current_session().state(), SessionState::Open);
    }

    #[test]
    fn test_same_lane_cannot_start_twice() {
        let mut lane = CheckoutLane::new(shared_store());
        lane.start_transaction(CashierId::new("C1")).unwrap();
        assert!(matches!(
            lane.start_transaction(CashierId::new("C2")),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_lanes_share_the_ledger() {
        let store = shared_store();
        let mut lane1 = CheckoutLane::new(store.clone());
        let mut lane2 = CheckoutLane::new(store.clone());
        lane1.start_transaction(CashierId::new("C1")).unwrap();
        lane2.start_transaction(CashierId::new("C2")).unwrap();

        lane1.add_item("P002", 2).unwrap();
        assert!(matches!(
            lane2.add_item("P002", 1),
            Err(CoreError::InsufficientStock { available: 0, .. })
        ));

        lane1.cancel_transaction().unwrap();
        lane2.add_item("P002", 1).unwrap();
        assert_eq!(store.with_store(|s| s.ledger().quantity_of("P002")), 1);
    }

    #[test]
    fn test_full_lane_flow() {
        let store = shared_store();
        let mut lane = CheckoutLane::new(store.clone());

        lane.start_transaction(CashierId::new("C1")).unwrap();
        lane.add_item("P001", 3).unwrap();
        lane.set_customer("5551234").unwrap();
        let redemption = lane.apply_loyalty_redemption(true).unwrap();
        assert_eq!(redemption.discount.cents(), 200);
        assert_eq!(lane.current_totals().final_amount.cents(), 2500);

        let receipt = lane.complete_transaction().unwrap();
        assert_eq!(receipt.final_total.cents(), 2500);

        store.with_store(|s| {
            let customer = s.customers().lookup("5551234").unwrap();
            assert_eq!(customer.points(), 75);
            assert_eq!(customer.history().len(), 1);
            assert_eq!(s.aggregator().transaction_count(), 1);
            assert!(!s.is_cashier_busy(&CashierId::new("C1")));
        });
    }

    #[test]
    fn test_dropping_lane_cancels_open_session() {
        let store = shared_store();
        {
            let mut lane = CheckoutLane::new(store.clone());
            lane.start_transaction(CashierId::new("C1")).unwrap();
            lane.add_item("P001", 4).unwrap();
            assert_eq!(store.with_store(|s| s.ledger().quantity_of("P001")), 6);
        }
        store.with_store(|s| {
            assert_eq!(s.ledger().quantity_of("P001"), 10);
            assert!(!s.is_cashier_busy(&CashierId::new("C1")));
        });
    }

    #[test]
    fn test_manager_operations() {
        let store = shared_store();
        store.with_store_mut(|s| {
            assert_eq!(s.restock("P002", 5).unwrap(), 7);
            assert!(s.restock("P002", 0).is_err());
            assert!(matches!(s.restock("NOPE", 1), Err(CoreError::ProductNotFound(_))));

            s.set_base_price("P002", Money::from_cents(300)).unwrap();
            s.set_weekly_offer("P002", true).unwrap();
            assert_eq!(s.catalog().lookup("P002").unwrap().unit_price().cents(), 270);

            assert_eq!(s.discontinue("P002").unwrap(), 7);
            assert!(s.catalog().lookup("P002").is_none());
            assert_eq!(s.ledger().quantity_of("P002"), 0);
        });
    }

    #[test]
    fn test_oversized_restock_is_rejected() {
        let store = shared_store();
        store.with_store_mut(|s| {
            let err = s.restock("P001", i64::MAX).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::OutOfRange { .. })
            ));
            assert!(s.restock("P001", crate::MAX_RESTOCK_QUANTITY + 1).is_err());
            assert_eq!(s.ledger().quantity_of("P001"), 10);

            assert_eq!(
                s.restock("P001", crate::MAX_RESTOCK_QUANTITY).unwrap(),
                10 + crate::MAX_RESTOCK_QUANTITY
            );
        });
    }

    #[test]
    fn test_reports() {
        let store = shared_store();
        let mut lane = CheckoutLane::new(store.clone());
        lane.start_transaction(CashierId::new("C1")).unwrap();
        lane.add_item("P002", 1).unwrap();
        lane.set_customer("5551234").unwrap();
        lane.complete_transaction().unwrap();

        let (inventory, sales) = store.with_store(|s| (s.inventory_report(), s.sales_report()));

        assert_eq!(inventory.rows.len(), 2);
        assert!(inventory.to_string().contains("P002: 1 units (Milk - Dairy)"));

        assert_eq!(sales.transaction_count, 1);
        assert_eq!(sales.customers[0].name.as_deref(), Some("Ana Silva"));
        assert_eq!(sales.total_sales.cents(), 250);
    }
}
