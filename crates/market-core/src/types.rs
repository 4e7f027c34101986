//! # Domain Types
//!
//! Core domain types used throughout Market POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │    Customer     │   │  TransactionRecord   │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  code (key)     │   │  phone (key)    │   │  id (UUID)           │  │
//! │  │  name           │   │  name, surname  │   │  date                │  │
//! │  │  category       │   │  email          │   │  amount              │  │
//! │  │  base_price     │   │  loyalty        │   │  customer_phone      │  │
//! │  │  weekly_offer   │   │  history ───────┼──►│  (append-only)       │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   CashierId     │   │  SessionState   │                             │
//! │  │  (opaque key)   │   │  Idle → Open    │                             │
//! │  └─────────────────┘   │  → Closed       │                             │
//! │                        │  → Cancelled    │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::loyalty::LoyaltyAccount;
use crate::money::Money;
use crate::pricing::PricingEngine;
use crate::validation::{
    validate_category, validate_email, validate_phone, validate_price, validate_product_code,
    validate_product_name, validate_person_name,
};

// =============================================================================
// Cashier
// =============================================================================

/// Opaque cashier identifier (the employee's passport/badge id).
///
/// The engine never needs more than the key, so there is no employee
/// hierarchy here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashierId(String);

impl CashierId {
    /// Creates a cashier id, trimming surrounding whitespace.
    pub fn new(id: impl Into<String>) -> Self {
        CashierId(id.into().trim().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CashierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CashierId {
    fn from(id: &str) -> Self {
        CashierId::new(id)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Fields are private: the only mutations are the explicit price and offer
/// setters, both of which keep the base price positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    code: String,
    name: String,
    category: String,
    base_price: Money,
    weekly_offer: bool,
}

impl Product {
    /// Creates a validated product.
    ///
    /// ## Rules
    /// - code: non-empty, at most 50 characters, letters/digits/`-`/`_`
    /// - name: non-empty, at most 100 characters
    /// - category: non-empty
    /// - base price: strictly positive
    pub fn new(
        code: &str,
        name: &str,
        category: &str,
        base_price: Money,
        weekly_offer: bool,
    ) -> CoreResult<Self> {
        validate_product_code(code)?;
        validate_product_name(name)?;
        validate_category(category)?;
        validate_price(base_price)?;

        Ok(Product {
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            base_price,
            weekly_offer,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Price before any offer.
    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn is_on_weekly_offer(&self) -> bool {
        self.weekly_offer
    }

    /// Current unit price, with the weekly offer applied when active.
    pub fn unit_price(&self) -> Money {
        PricingEngine::unit_price(self)
    }

    /// Changes the base price. Rejects zero and negative prices.
    pub fn set_base_price(&mut self, price: Money) -> CoreResult<()> {
        validate_price(price)?;
        self.base_price = price;
        Ok(())
    }

    /// Turns the weekly offer on or off.
    pub fn set_weekly_offer(&mut self, on_offer: bool) {
        self.weekly_offer = on_offer;
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// Immutable audit record of a completed transaction.
///
/// Appended to a customer's history at completion and never touched again;
/// there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    id: Uuid,
    date: DateTime<Utc>,
    amount: Money,
    customer_phone: Option<String>,
}

impl TransactionRecord {
    /// Records a transaction that happened just now.
    pub fn new(amount: Money, customer_phone: Option<String>) -> Self {
        TransactionRecord {
            id: Uuid::new_v4(),
            date: Utc::now(),
            amount,
            customer_phone,
        }
    }

    /// Rebuilds a record loaded from storage.
    pub fn restore(
        id: Uuid,
        date: DateTime<Utc>,
        amount: Money,
        customer_phone: Option<String>,
    ) -> Self {
        TransactionRecord {
            id,
            date,
            amount,
            customer_phone,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction [Date: {}, Amount: {}]",
            self.date.format("%Y-%m-%d"),
            self.amount
        )
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered loyalty customer, keyed by phone number.
///
/// The loyalty balance and history are only changed by the checkout flow
/// (`pub(crate)` mutators); everything outside the crate reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    phone: String,
    name: String,
    surname: String,
    email: String,
    loyalty: LoyaltyAccount,
    history: Vec<TransactionRecord>,
}

impl Customer {
    /// Registers a new customer with zero points and no history.
    pub fn new(name: &str, surname: &str, phone: &str, email: &str) -> CoreResult<Self> {
        Customer::restore(name, surname, phone, email, 0, Vec::new())
    }

    /// Rebuilds a customer loaded from storage.
    pub fn restore(
        name: &str,
        surname: &str,
        phone: &str,
        email: &str,
        points: i64,
        history: Vec<TransactionRecord>,
    ) -> CoreResult<Self> {
        validate_person_name("name", name)?;
        validate_person_name("surname", surname)?;
        validate_phone(phone)?;
        validate_email(email)?;

        Ok(Customer {
            phone: phone.trim().to_string(),
            name: name.trim().to_string(),
            surname: surname.trim().to_string(),
            email: email.trim().to_string(),
            loyalty: LoyaltyAccount::with_balance(points)?,
            history,
        })
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// "Name Surname", as printed on receipts.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn loyalty(&self) -> &LoyaltyAccount {
        &self.loyalty
    }

    /// Current point balance.
    pub fn points(&self) -> i64 {
        self.loyalty.balance()
    }

    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub(crate) fn loyalty_mut(&mut self) -> &mut LoyaltyAccount {
        &mut self.loyalty
    }

    pub(crate) fn record_transaction(&mut self, record: TransactionRecord) {
        self.history.push(record);
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle state of a cart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, not started.
    #[default]
    Idle,
    /// Items, customer and redemption may change.
    Open,
    /// Completed; receipt issued. Terminal.
    Closed,
    /// Cancelled; stock restored. Terminal.
    Cancelled,
}

impl SessionState {
    /// Closed and Cancelled accept no further operations.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
