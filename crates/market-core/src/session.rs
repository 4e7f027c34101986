//! # Cart Session
//!
//! One checkout transaction from `start` to `complete` or `cancel`.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──start(cashier)──► Open ──complete()──► Closed   (terminal)    │
//! │                             │ ▲                                         │
//! │                             │ │ add_item / set_customer /               │
//! │                             │ │ apply_loyalty_redemption                │
//! │                             └─┘                                         │
//! │                             │                                           │
//! │                             └────cancel()─────► Cancelled (terminal)    │
//! │                                                                         │
//! │   Any operation in the wrong state → InvalidState, nothing changes.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Running Totals
//! ```text
//! subtotal         = Σ base_price × qty          (before any discount)
//! offer_discount   = Σ (base_price - unit) × qty (weekly offers)
//! amount           = Σ unit_price × qty          (= subtotal - offer_discount)
//! loyalty_discount = Σ redemptions               (≤ amount)
//! final_amount     = amount - loyalty_discount   (≥ 0)
//! ```
//!
//! Every operation validates and checks everything it can before touching the
//! ledger or a loyalty account, so a rejected call leaves the session, the
//! ledger and the customer exactly as they were.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregator::{CompletedSale, SalesAggregator};
use crate::catalog::{CustomerDirectory, ProductCatalog};
use crate::error::{CoreError, CoreResult};
use crate::inventory::InventoryLedger;
use crate::loyalty::Redemption;
use crate::money::Money;
use crate::pricing::PricingEngine;
use crate::receipt::{Receipt, ReceiptBuilder};
use crate::types::{CashierId, SessionState, TransactionRecord};
use crate::validation::{validate_cashier_id, validate_phone, validate_product_code, validate_quantity};

// =============================================================================
// Cart Line
// =============================================================================

/// One `add_item` call. The price is locked when the line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub code: String,
    pub name: String,
    /// Base price at add time.
    pub base_price: Money,
    /// Unit price actually charged (offer applied).
    pub unit_price: Money,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// unit_price × quantity
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// (base_price - unit_price) × quantity
    pub fn offer_discount(&self) -> Money {
        (self.base_price - self.unit_price) * self.quantity
    }
}

/// The customer bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundCustomer {
    pub phone: String,
    pub name: String,
}

/// Snapshot of a session's money figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Before any discount.
    pub subtotal: Money,
    pub offer_discount: Money,
    pub loyalty_discount: Money,
    /// offer_discount + loyalty_discount
    pub discount: Money,
    /// After offers, before loyalty.
    pub amount: Money,
    /// What the customer pays.
    pub final_amount: Money,
    pub item_count: i64,
}

// =============================================================================
// Cart Session
// =============================================================================

/// A single checkout transaction.
///
/// The session owns its lines and totals. The ledger, catalog and customer
/// directory are borrowed per call so that several sessions can share them
/// through one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSession {
    id: Uuid,
    state: SessionState,
    cashier: Option<CashierId>,
    lines: Vec<CartLine>,
    subtotal: Money,
    offer_discount: Money,
    amount: Money,
    loyalty_discount: Money,
    points_redeemed: i64,
    customer: Option<BoundCustomer>,
    opened_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
}

impl Default for CartSession {
    fn default() -> Self {
        CartSession::new()
    }
}

impl CartSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        CartSession {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            cashier: None,
            lines: Vec::new(),
            subtotal: Money::zero(),
            offer_discount: Money::zero(),
            amount: Money::zero(),
            loyalty_discount: Money::zero(),
            points_redeemed: 0,
            customer: None,
            opened_at: None,
            closed_at: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cashier(&self) -> Option<&CashierId> {
        self.cashier.as_ref()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn customer(&self) -> Option<&BoundCustomer> {
        self.customer.as_ref()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn offer_discount(&self) -> Money {
        self.offer_discount
    }

    /// Payable amount after offers, before loyalty.
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn loyalty_discount(&self) -> Money {
        self.loyalty_discount
    }

    /// Points taken from the customer by redemptions in this session.
    pub fn points_redeemed(&self) -> i64 {
        self.points_redeemed
    }

    /// `amount - loyalty_discount`. Equals `amount` until points are redeemed.
    pub fn final_amount(&self) -> Money {
        self.amount - self.loyalty_discount
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            subtotal: self.subtotal,
            offer_discount: self.offer_discount,
            loyalty_discount: self.loyalty_discount,
            discount: self.offer_discount + self.loyalty_discount,
            amount: self.amount,
            final_amount: self.final_amount(),
            item_count: self.lines.iter().map(|l| l.quantity).sum(),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Idle → Open under `cashier`.
    pub fn start(&mut self, cashier: CashierId) -> CoreResult<()> {
        self.require(SessionState::Idle, "start a transaction")?;
        validate_cashier_id(cashier.as_str())?;

        info!(session_id = %self.id, cashier = %cashier, "Transaction started");
        self.cashier = Some(cashier);
        self.state = SessionState::Open;
        self.opened_at = Some(Utc::now());
        Ok(())
    }

    /// Adds `quantity` units of `code` at the product's current price.
    ///
    /// ## Flow
    /// ```text
    /// validate code + qty ──► catalog lookup ──► ledger.reserve ──► push line
    ///        │                     │                  │
    ///        ▼                     ▼                  ▼
    ///   Validation         ProductNotFound    InsufficientStock
    /// ```
    /// Any failure leaves the session and the ledger unchanged.
    pub fn add_item<C>(
        &mut self,
        catalog: &C,
        ledger: &mut InventoryLedger,
        code: &str,
        quantity: i64,
    ) -> CoreResult<&CartLine>
    where
        C: ProductCatalog + ?Sized,
    {
        self.require(SessionState::Open, "add items")?;
        validate_product_code(code)?;
        validate_quantity(quantity)?;

        let code = code.trim();
        let product = catalog
            .lookup(code)
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;

        if let Err(err) = ledger.reserve(code, quantity) {
            warn!(session_id = %self.id, code = %code, quantity, "Add rejected: insufficient stock");
            return Err(err);
        }

        let price = PricingEngine::price_line(product, quantity);
        self.subtotal += price.base_total;
        self.offer_discount += price.offer_discount;
        self.amount += price.line_total;

        debug!(
            session_id = %self.id,
            code = %code,
            quantity,
            unit_price = %price.unit_price,
            amount = %self.amount,
            "Item added"
        );

        self.lines.push(CartLine {
            code: code.to_string(),
            name: product.name().to_string(),
            base_price: product.base_price(),
            unit_price: price.unit_price,
            quantity,
            added_at: Utc::now(),
        });

        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Binds a loyalty customer by phone.
    ///
    /// Rebinding the same customer is a no-op. Once points have been redeemed
    /// the customer cannot be replaced.
    pub fn set_customer<D>(&mut self, directory: &D, phone: &str) -> CoreResult<&BoundCustomer>
    where
        D: CustomerDirectory + ?Sized,
    {
        self.require(SessionState::Open, "set the customer")?;
        validate_phone(phone)?;
        let phone = phone.trim();

        if self.points_redeemed > 0 {
            if let Some(bound) = self.customer.as_ref().filter(|c| c.phone != phone) {
                warn!(session_id = %self.id, bound = %bound.phone, "Customer change rejected after redemption");
                return Err(CoreError::invalid_state(
                    "replace the customer after redeeming points",
                    self.state,
                ));
            }
        }

        let customer = directory
            .lookup(phone)
            .ok_or_else(|| CoreError::CustomerNotFound(phone.to_string()))?;

        info!(session_id = %self.id, phone = %phone, "Customer bound");
        let bound = self.customer.insert(BoundCustomer {
            phone: customer.phone().to_string(),
            name: customer.full_name(),
        });
        Ok(&*bound)
    }

    /// Redeems the bound customer's points against the remaining payable
    /// amount when `use_points` is true.
    ///
    /// Without a bound customer, or with `use_points == false`, nothing
    /// changes and a zero redemption is returned. Repeated calls redeem
    /// against what is still payable; a discount already granted is kept.
    pub fn apply_loyalty_redemption<D>(
        &mut self,
        directory: &mut D,
        use_points: bool,
    ) -> CoreResult<Redemption>
    where
        D: CustomerDirectory + ?Sized,
    {
        self.require(SessionState::Open, "redeem points")?;

        let phone = match (&self.customer, use_points) {
            (Some(bound), true) => bound.phone.clone(),
            _ => return Ok(Redemption::none()),
        };

        let customer = directory
            .lookup_mut(&phone)
            .ok_or_else(|| CoreError::CustomerNotFound(phone.clone()))?;

        let redemption = customer.loyalty_mut().redeem(self.final_amount());
        self.loyalty_discount += redemption.discount;
        self.points_redeemed += redemption.points_consumed;

        info!(
            session_id = %self.id,
            phone = %phone,
            discount = %redemption.discount,
            points = redemption.points_consumed,
            final_amount = %self.final_amount(),
            "Loyalty points redeemed"
        );
        Ok(redemption)
    }

    /// Open → Closed.
    ///
    /// ## Settlement
    /// ```text
    /// final = amount - loyalty_discount
    ///   │
    ///   ├── customer bound? ── history += TransactionRecord(now, final)
    ///   │                      points   += floor(final)
    ///   │
    ///   ├── aggregator.record(cashier, customer, final, earned, redeemed)
    ///   │
    ///   └── Receipt
    /// ```
    pub fn complete<D>(
        &mut self,
        directory: &mut D,
        aggregator: &mut SalesAggregator,
    ) -> CoreResult<Receipt>
    where
        D: CustomerDirectory + ?Sized,
    {
        self.require(SessionState::Open, "complete the transaction")?;
        let cashier = self
            .cashier
            .clone()
            .ok_or_else(|| CoreError::invalid_state("complete without a cashier", self.state))?;

        let final_amount = self.final_amount();
        let points_consumed = self.points_redeemed;

        let mut points_earned = 0;
        let mut points_balance = None;
        if let Some(bound) = &self.customer {
            let customer = directory
                .lookup_mut(&bound.phone)
                .ok_or_else(|| CoreError::CustomerNotFound(bound.phone.clone()))?;

            customer.record_transaction(TransactionRecord::new(
                final_amount,
                Some(bound.phone.clone()),
            ));
            points_earned = customer.loyalty_mut().accrue(final_amount);
            points_balance = Some(customer.points());
        }

        aggregator.record(CompletedSale {
            cashier: cashier.clone(),
            customer_phone: self.customer.as_ref().map(|c| c.phone.clone()),
            final_amount,
            points_earned,
            points_redeemed: points_consumed,
        });

        self.closed_at = Some(Utc::now());
        let receipt = ReceiptBuilder::new(self)
            .loyalty(points_earned, points_balance)
            .build();
        self.state = SessionState::Closed;

        info!(
            session_id = %self.id,
            cashier = %cashier,
            final_amount = %final_amount,
            points_earned,
            points_redeemed = points_consumed,
            "Transaction completed"
        );
        Ok(receipt)
    }

    /// Open → Cancelled.
    ///
    /// Puts every reserved unit back in the ledger (summed per code) and
    /// returns any redeemed points to the customer. Nothing reaches the
    /// aggregator.
    pub fn cancel<D>(&mut self, ledger: &mut InventoryLedger, directory: &mut D) -> CoreResult<()>
    where
        D: CustomerDirectory + ?Sized,
    {
        self.require(SessionState::Open, "cancel the transaction")?;

        let mut reserved: BTreeMap<&str, i64> = BTreeMap::new();
        for line in &self.lines {
            *reserved.entry(line.code.as_str()).or_insert(0) += line.quantity;
        }
        for (code, quantity) in reserved {
            ledger.restore(code, quantity)?;
        }

        if self.points_redeemed > 0 {
            if let Some(customer) = self
                .customer
                .as_ref()
                .and_then(|bound| directory.lookup_mut(&bound.phone))
            {
                customer.loyalty_mut().refund(self.points_redeemed);
            }
        }

        self.state = SessionState::Cancelled;
        self.closed_at = Some(Utc::now());

        info!(
            session_id = %self.id,
            lines = self.lines.len(),
            points_refunded = self.points_redeemed,
            "Transaction cancelled"
        );
        Ok(())
    }

    fn require(&self, expected: SessionState, operation: &str) -> CoreResult<()> {
        if self.state != expected {
            warn!(session_id = %self.id, state = %self.state, operation, "Operation rejected");
            return Err(CoreError::invalid_state(operation, self.state));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CustomerBook};
    use crate::types::{Customer, Product};

    struct Fixture {
        catalog: Catalog,
        ledger: InventoryLedger,
        customers: CustomerBook,
        aggregator: SalesAggregator,
    }

    fn fixture() -> Fixture {
        let mut catalog = Catalog::new();
        catalog
            .insert(Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), true).unwrap())
            .unwrap();
        catalog
            .insert(Product::new("P002", "Milk", "Dairy", Money::from_cents(250), false).unwrap())
            .unwrap();

        let ledger =
            InventoryLedger::from_entries([("P001".to_string(), 10), ("P002".to_string(), 5)])
                .unwrap();

        let mut customers = CustomerBook::new();
        customers
            .register(
                Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 250, Vec::new())
                    .unwrap(),
            )
            .unwrap();

        Fixture {
            catalog,
            ledger,
            customers,
            aggregator: SalesAggregator::new(),
        }
    }

    fn open_session() -> CartSession {
        let mut session = CartSession::new();
        session.start(CashierId::new("C1")).unwrap();
        session
    }

    #[test]
    fn test_operations_require_open() {
        let mut f = fixture();
        let mut session = CartSession::new();

        assert!(matches!(
            session.add_item(&f.catalog, &mut f.ledger, "P001", 1),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(session.complete(&mut f.customers, &mut f.aggregator).is_err());
        assert_eq!(f.ledger.quantity_of("P001"), 10);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut session = open_session();
        assert!(matches!(
            session.start(CashierId::new("C2")),
            Err(CoreError::InvalidState { .. })
        ));
        assert_eq!(session.cashier().unwrap().as_str(), "C1");
    }

    #[test]
    fn test_start_requires_cashier() {
        let mut session = CartSession::new();
        assert!(session.start(CashierId::new("  ")).is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_add_item_updates_totals() {
        let mut f = fixture();
        let mut session = open_session();

        session.add_item(&f.catalog, &mut f.ledger, "P001", 3).unwrap();
        session.add_item(&f.catalog, &mut f.ledger, "P002", 2).unwrap();

        let totals = session.totals();
        assert_eq!(totals.subtotal.cents(), 3500);
        assert_eq!(totals.offer_discount.cents(), 300);
        assert_eq!(totals.amount.cents(), 3200);
        assert_eq!(totals.final_amount.cents(), 3200);
        assert_eq!(totals.item_count, 5);
        assert_eq!(f.ledger.quantity_of("P001"), 7);
        assert_eq!(f.ledger.quantity_of("P002"), 3);
    }

    #[test]
    fn test_add_item_rejects_bad_input_without_mutation() {
        let mut f = fixture();
        let mut session = open_session();

        assert!(matches!(
            session.add_item(&f.catalog, &mut f.ledger, "", 1),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            session.add_item(&f.catalog, &mut f.ledger, "P001", 0),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            session.add_item(&f.catalog, &mut f.ledger, "P002", 6),
            Err(CoreError::InsufficientStock { available: 5, .. })
        ));

        assert!(session.lines().is_empty());
        assert_eq!(session.totals(), CartTotals::default());
        assert_eq!(f.ledger.quantity_of("P002"), 5);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn test_price_locked_at_add_time() {
        let mut f = fixture();
        let mut session = open_session();

        session.add_item(&f.catalog, &mut f.ledger, "P002", 1).unwrap();
        f.catalog.set_weekly_offer("P002", true).unwrap();
        session.add_item(&f.catalog, &mut f.ledger, "P002", 1).unwrap();

        assert_eq!(session.lines()[0].unit_price.cents(), 250);
        assert_eq!(session.lines()[1].unit_price.cents(), 225);
        assert_eq!(session.amount().cents(), 475);
    }

    #[test]
    fn test_set_customer_unknown_phone() {
        let f = fixture();
        let mut session = open_session();

        assert!(matches!(
            session.set_customer(&f.customers, "9999"),
            Err(CoreError::CustomerNotFound(_))
        ));
        assert!(session.customer().is_none());
    }

    #[test]
    fn test_redemption_without_customer_is_noop() {
        let mut f = fixture();
        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 1).unwrap();

        let redemption = session.apply_loyalty_redemption(&mut f.customers, true).unwrap();
        assert_eq!(redemption, Redemption::none());
        assert_eq!(session.final_amount(), session.amount());
    }

    #[test]
    fn test_redemption_declined_keeps_balance() {
        let mut f = fixture();
        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 1).unwrap();
        session.set_customer(&f.customers, "5551234").unwrap();

        session.apply_loyalty_redemption(&mut f.customers, false).unwrap();
        assert_eq!(session.final_amount().cents(), 900);
        assert_eq!(f.customers.lookup("5551234").unwrap().points(), 250);
    }

    #[test]
    fn test_repeated_redemption_uses_remaining_amount() {
        let mut f = fixture();
        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P002", 1).unwrap();
        session.set_customer(&f.customers, "5551234").unwrap();

        // 250 points → at most 2.00; cart is 2.50
        let first = session.apply_loyalty_redemption(&mut f.customers, true).unwrap();
        assert_eq!(first.discount.cents(), 200);

        // 50 points left → nothing more
        let second = session.apply_loyalty_redemption(&mut f.customers, true).unwrap();
        assert_eq!(second, Redemption::none());

        session.apply_loyalty_redemption(&mut f.customers, false).unwrap();
        assert_eq!(session.loyalty_discount().cents(), 200);
        assert_eq!(session.final_amount().cents(), 50);
    }

    #[test]
    fn test_customer_locked_after_redemption() {
        let mut f = fixture();
        f.customers
            .register(Customer::new("Bo", "Lee", "5550000", "bo@example.com").unwrap())
            .unwrap();

        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 1).unwrap();
        session.set_customer(&f.customers, "5551234").unwrap();
        session.apply_loyalty_redemption(&mut f.customers, true).unwrap();

        assert!(matches!(
            session.set_customer(&f.customers, "5550000"),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(session.set_customer(&f.customers, "5551234").is_ok());
    }

    #[test]
    fn test_complete_without_customer() {
        let mut f = fixture();
        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 2).unwrap();

        let receipt = session.complete(&mut f.customers, &mut f.aggregator).unwrap();

        assert_eq!(receipt.final_total.cents(), 1800);
        assert!(receipt.customer.is_none());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(f.aggregator.transaction_count(), 1);
        assert_eq!(
            f.aggregator.cashier_sales().get(&CashierId::new("C1")).copied(),
            Some(Money::from_cents(1800))
        );
        assert!(f.aggregator.customer_activity().is_empty());
    }

    #[test]
    fn test_complete_is_terminal() {
        let mut f = fixture();
        let mut session = open_session();
        session.complete(&mut f.customers, &mut f.aggregator).unwrap();

        assert!(session.complete(&mut f.customers, &mut f.aggregator).is_err());
        assert!(session.cancel(&mut f.ledger, &mut f.customers).is_err());
        assert!(session.start(CashierId::new("C1")).is_err());
        assert_eq!(f.aggregator.transaction_count(), 1);
    }

    #[test]
    fn test_cancel_restores_stock_and_points() {
        let mut f = fixture();
        let mut session = open_session();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 2).unwrap();
        session.add_item(&f.catalog, &mut f.ledger, "P001", 3).unwrap();
        session.add_item(&f.catalog, &mut f.ledger, "P002", 5).unwrap();
        session.set_customer(&f.customers, "5551234").unwrap();
        session.apply_loyalty_redemption(&mut f.customers, true).unwrap();
        assert_eq!(f.customers.lookup("5551234").unwrap().points(), 50);

        session.cancel(&mut f.ledger, &mut f.customers).unwrap();

        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(f.ledger.quantity_of("P001"), 10);
        assert_eq!(f.ledger.quantity_of("P002"), 5);
        assert_eq!(f.customers.lookup("5551234").unwrap().points(), 250);
        assert!(f.customers.lookup("5551234").unwrap().history().is_empty());
        assert_eq!(f.aggregator.transaction_count(), 0);
    }
}
