//! # Database Pool Management
//!
//! Connection pool creation and store load/save for SQLite.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Terminal startup                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ──► Database::new(config).await                   │
//! │                               │  pool + WAL + foreign keys + migrations │
//! │                               ▼                                         │
//! │                          load_store() ──► Store (catalog, ledger,       │
//! │                               │           customers; empty aggregator)  │
//! │                               ▼                                         │
//! │                     ... checkout lanes run in memory ...                │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                          save_store(&store)  (one transaction)          │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                          close()                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::TransactionRepository;
use market_core::{Catalog, CustomerBook, Store};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/market.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`. The file is
    /// created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the connection pool and runs migrations if enabled.
    ///
    /// SQLite is configured with WAL journaling, NORMAL synchronous mode and
    /// foreign keys on.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Called by `new()` unless disabled.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Store load/save
    // -------------------------------------------------------------------------

    /// Loads catalog, ledger and customers (with history) into a new
    /// [`Store`]. The sales aggregator starts empty.
    pub async fn load_store(&self) -> DbResult<Store> {
        let mut catalog = Catalog::new();
        for product in self.products().list().await? {
            catalog
                .insert(product)
                .map_err(|e| DbError::invalid_data("product", e))?;
        }

        let ledger = self.inventory().load().await?;

        let mut customers = CustomerBook::new();
        for customer in self.customers().list().await? {
            customers
                .register(customer)
                .map_err(|e| DbError::invalid_data("customer", e))?;
        }

        info!(
            products = catalog.len(),
            stock_entries = ledger.len(),
            customers = customers.len(),
            "Store loaded"
        );
        Ok(Store::from_parts(catalog, ledger, customers))
    }

    /// Writes the store's catalog, ledger, customers and any new history
    /// records in one transaction.
    ///
    /// Products missing from the catalog are deleted; the ledger table is
    /// replaced; customers are upserted; history is appended idempotently.
    pub async fn save_store(&self, store: &Store) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for product in store.catalog().iter() {
            ProductRepository::upsert_on(&mut *tx, product).await?;
        }
        let codes: Vec<&str> = store.catalog().iter().map(|p| p.code()).collect();
        let removed = ProductRepository::retain_on(&mut *tx, &codes).await?;

        InventoryRepository::replace_on(&mut *tx, store.ledger()).await?;

        let mut new_records = 0;
        for customer in store.customers().iter() {
            CustomerRepository::upsert_on(&mut *tx, customer).await?;
            for record in customer.history() {
                if TransactionRepository::append_on(&mut *tx, customer.phone(), record).await? {
                    new_records += 1;
                }
            }
        }

        tx.commit().await?;

        info!(
            products = codes.len(),
            products_removed = removed,
            customers = store.customers().len(),
            new_records,
            "Store saved"
        );
        Ok(())
    }

    /// Closes the connection pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
