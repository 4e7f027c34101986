//! # Inventory Repository
//!
//! Persists the [`InventoryLedger`] as `(code, quantity)` rows.
//!
//! The ledger is written as a whole: `replace` clears the table and inserts
//! the current snapshot inside one transaction, so a crash mid-save leaves
//! the previous stock intact.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use market_core::InventoryLedger;

#[derive(Debug, Clone, sqlx::FromRow)]
struct InventoryRow {
    code: String,
    quantity: i64,
}

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Builds a ledger from every stored row.
    pub async fn load(&self) -> DbResult<InventoryLedger> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT code, quantity FROM inventory ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded inventory rows");
        InventoryLedger::from_entries(rows.into_iter().map(|r| (r.code, r.quantity)))
            .map_err(|e| DbError::invalid_data("inventory", e))
    }

    /// Stored quantity for one code (0 if absent).
    pub async fn quantity(&self, code: &str) -> DbResult<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM inventory WHERE code = ?1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Replaces the stored ledger with `ledger`.
    pub async fn replace(&self, ledger: &InventoryLedger) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::replace_on(&mut *tx, ledger).await?;
        tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn replace_on(
        conn: &mut SqliteConnection,
        ledger: &InventoryLedger,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("DELETE FROM inventory")
            .execute(&mut *conn)
            .await?;

        for (code, quantity) in ledger.iter() {
            sqlx::query("INSERT INTO inventory (code, quantity, updated_at) VALUES (?1, ?2, ?3)")
                .bind(code)
                .bind(quantity)
                .bind(now)
                .execute(&mut *conn)
                .await?;
        }

        info!(entries = ledger.len(), "Inventory saved");
        Ok(())
    }
}
