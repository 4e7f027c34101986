//! # Transaction Repository
//!
//! Append-only customer purchase history.
//!
//! Records are written with `INSERT OR IGNORE` keyed on their UUID, so
//! saving the same customer history twice never duplicates a row.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use market_core::{Money, TransactionRecord};

#[derive(Debug, Clone, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    customer_phone: String,
    date: DateTime<Utc>,
    amount_cents: i64,
}

impl TransactionRow {
    fn into_record(self) -> DbResult<TransactionRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DbError::invalid_data(format!("transaction {}", self.id), e))?;

        Ok(TransactionRecord::restore(
            id,
            self.date,
            Money::from_cents(self.amount_cents),
            Some(self.customer_phone),
        ))
    }
}

/// Repository for customer transaction records.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Stores a record for `phone`.
    ///
    /// ## Returns
    /// `true` if the record was new, `false` if its id was already stored.
    pub async fn append(&self, phone: &str, record: &TransactionRecord) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::append_on(&mut *conn, phone, record).await
    }

    pub(crate) async fn append_on(
        conn: &mut SqliteConnection,
        phone: &str,
        record: &TransactionRecord,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO customer_transactions (id, customer_phone, date, amount_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(record.id().to_string())
        .bind(phone)
        .bind(record.date())
        .bind(record.amount().cents())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// History for one customer, oldest first.
    pub async fn history(&self, phone: &str) -> DbResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, customer_phone, date, amount_cents
            FROM customer_transactions
            WHERE customer_phone = ?1
            ORDER BY date, id
            "#,
        )
        .bind(phone)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_record).collect()
    }

    /// Every stored record grouped by customer phone, each list oldest first.
    pub async fn all_by_customer(&self) -> DbResult<HashMap<String, Vec<TransactionRecord>>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, customer_phone, date, amount_cents
            FROM customer_transactions
            ORDER BY customer_phone, date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded transaction history");

        let mut grouped: HashMap<String, Vec<TransactionRecord>> = HashMap::new();
        for row in rows {
            let phone = row.customer_phone.clone();
            grouped.entry(phone).or_default().push(row.into_record()?);
        }
        Ok(grouped)
    }

    /// Counts stored records (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use market_core::Customer;

    async fn db_with_customer() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers()
            .upsert(&Customer::new("Ana", "Silva", "5551234", "ana@example.com").unwrap())
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_append_is_idempotent() {
        let db = db_with_customer().await;
        let repo = db.transactions();
        let record = TransactionRecord::new(Money::from_cents(4800), Some("5551234".to_string()));

        assert!(repo.append("5551234", &record).await.unwrap());
        assert!(!repo.append("5551234", &record).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let history = repo.history("5551234").await.unwrap();
        assert_eq!(history, vec![record]);
    }

    #[tokio::test]
    async fn test_append_requires_customer() {
        let db = db_with_customer().await;
        let record = TransactionRecord::new(Money::from_cents(100), None);

        assert!(matches!(
            db.transactions().append("0000", &record).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
