//! # Repository Module
//!
//! Database repository implementations for Market POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::load_store / save_store                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository      products               (catalog)               │
//! │  InventoryRepository    inventory              (ledger)                │
//! │  CustomerRepository     customers              (loyalty balances)      │
//! │  TransactionRepository  customer_transactions  (append-only history)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository offers pool-backed methods for ad-hoc use, plus
//! crate-internal `*_on(&mut SqliteConnection, ..)` variants that
//! `save_store` runs inside a single transaction.

pub mod customer;
pub mod inventory;
pub mod product;
pub mod transaction;
