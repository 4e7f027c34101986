//! # market-core: Transaction & Loyalty Settlement Engine
//!
//! Cart sessions, stock reservation, offer pricing, loyalty points and sales
//! aggregation for Market POS, as plain in-process code with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Market POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  market-terminal (console)                      │   │
//! │  │    start ──► add ──► customer ──► redeem ──► complete/cancel    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CheckoutLane API                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ market-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  session  │  │ inventory │  │  pricing  │  │  loyalty  │  │   │
//! │  │   │CartSession│  │  Ledger   │  │  offers   │  │  points   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │aggregator │  │  receipt  │  │  catalog  │  │   store   │  │   │
//! │  │   │  reports  │  │  builder  │  │ customers │  │   lanes   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CONSOLE                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  market-db (SQLite)                             │   │
//! │  │         load Store at startup, save Store at shutdown           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - CartSession state machine and running totals
//! - [`inventory`] - InventoryLedger (stock per product code)
//! - [`pricing`] - Weekly offer price math
//! - [`loyalty`] - LoyaltyAccount redemption and accrual
//! - [`aggregator`] - SalesAggregator and SalesReport
//! - [`receipt`] - Receipt and ReceiptBuilder
//! - [`catalog`] - ProductCatalog / CustomerDirectory and in-memory impls
//! - [`store`] - Store, SharedStore and CheckoutLane
//! - [`types`] - Product, Customer, TransactionRecord, CashierId
//! - [`money`] - Money in integer cents
//! - [`error`] / [`validation`] - Typed errors and input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use market_core::money::Money;
//! use market_core::store::{CheckoutLane, SharedStore, Store};
//! use market_core::types::{CashierId, Customer, Product};
//!
//! let mut store = Store::new();
//! store
//!     .add_product(Product::new("P001", "Coffee", "Grocery", Money::from_cents(1000), false).unwrap(), 50)
//!     .unwrap();
//! store
//!     .register_customer(Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 250, vec![]).unwrap())
//!     .unwrap();
//!
//! let mut lane = CheckoutLane::new(SharedStore::new(store));
//! lane.start_transaction(CashierId::new("C1")).unwrap();
//! lane.add_item("P001", 5).unwrap();
//! lane.set_customer("5551234").unwrap();
//! lane.apply_loyalty_redemption(true).unwrap();
//!
//! let receipt = lane.complete_transaction().unwrap();
//! assert_eq!(receipt.final_total.cents(), 4800);
//! assert_eq!(receipt.customer.unwrap().points_balance, Some(98));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::{SalesAggregator, SalesReport};
pub use catalog::{Catalog, CustomerBook, CustomerDirectory, ProductCatalog};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::InventoryLedger;
pub use loyalty::{LoyaltyAccount, Redemption};
pub use money::Money;
pub use pricing::PricingEngine;
pub use receipt::{Receipt, ReceiptBuilder};
pub use session::{CartSession, CartTotals};
pub use store::{CheckoutLane, SharedStore, Store};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single `add_item` call.
///
/// Catches typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum quantity of a single `restock` call.
pub const MAX_RESTOCK_QUANTITY: i64 = 100_000;
