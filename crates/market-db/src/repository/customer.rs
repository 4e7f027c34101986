//! # Customer Repository
//!
//! Loyalty customers and their point balances. History rows live in
//! `customer_transactions` and are joined in by [`CustomerRepository::list`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::transaction::TransactionRepository;
use market_core::Customer;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CustomerRow {
    phone: String,
    name: String,
    surname: String,
    email: String,
    points: i64,
}

impl CustomerRow {
    fn into_customer(self, history: Vec<market_core::TransactionRecord>) -> DbResult<Customer> {
        Customer::restore(
            &self.name,
            &self.surname,
            &self.phone,
            &self.email,
            self.points,
            history,
        )
        .map_err(|e| DbError::invalid_data(format!("customer {}", self.phone), e))
    }
}

/// Repository for loyalty customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// All customers with their full history, ordered by phone.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT phone, name, surname, email, points
            FROM customers
            ORDER BY phone
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut history = TransactionRepository::new(self.pool.clone())
            .all_by_customer()
            .await?;

        debug!(count = rows.len(), "Loaded customers");
        rows.into_iter()
            .map(|row| {
                let records = history.remove(&row.phone).unwrap_or_default();
                row.into_customer(records)
            })
            .collect()
    }

    /// Gets a customer (with history) by phone.
    pub async fn get(&self, phone: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT phone, name, surname, email, points
            FROM customers
            WHERE phone = ?1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let history = TransactionRepository::new(self.pool.clone())
                    .history(phone)
                    .await?;
                row.into_customer(history).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Inserts a customer or updates name, email and points. History is
    /// written separately through the transaction repository.
    pub async fn upsert(&self, customer: &Customer) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_on(&mut *conn, customer).await
    }

    pub(crate) async fn upsert_on(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
        debug!(phone = %customer.phone(), points = customer.points(), "Upserting customer");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO customers (phone, name, surname, email, points, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (phone) DO UPDATE SET
                name = excluded.name,
                surname = excluded.surname,
                email = excluded.email,
                points = excluded.points,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(customer.phone())
        .bind(customer.name())
        .bind(customer.surname())
        .bind(customer.email())
        .bind(customer.points())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes a customer and, by cascade, their history.
    pub async fn delete(&self, phone: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE phone = ?1")
            .bind(phone)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", phone));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use market_core::{Money, TransactionRecord};

    #[tokio::test]
    async fn test_upsert_updates_points() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 250, vec![])
            .unwrap();
        repo.upsert(&customer).await.unwrap();

        let updated = Customer::restore("Ana", "Silva", "5551234", "ana@example.com", 98, vec![])
            .unwrap();
        repo.upsert(&updated).await.unwrap();

        let loaded = repo.get("5551234").await.unwrap().unwrap();
        assert_eq!(loaded.points(), 98);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_joins_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        repo.upsert(&Customer::new("Ana", "Silva", "5551234", "ana@example.com").unwrap())
            .await
            .unwrap();
        repo.upsert(&Customer::new("Bo", "Lee", "5550000", "bo@example.com").unwrap())
            .await
            .unwrap();

        let record = TransactionRecord::new(Money::from_cents(4800), Some("5551234".to_string()));
        db.transactions().append("5551234", &record).await.unwrap();

        let customers = repo.list().await.unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].phone(), "5550000");
        assert!(customers[0].history().is_empty());
        assert_eq!(customers[1].history(), &[record][..]);
    }

    #[tokio::test]
    async fn test_delete_cascades_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers()
            .upsert(&Customer::new("Ana", "Silva", "5551234", "ana@example.com").unwrap())
            .await
            .unwrap();
        let record = TransactionRecord::new(Money::from_cents(100), Some("5551234".to_string()));
        db.transactions().append("5551234", &record).await.unwrap();

        db.customers().delete("5551234").await.unwrap();
        assert_eq!(db.transactions().count().await.unwrap(), 0);
        assert!(db.customers().delete("5551234").await.is_err());
    }
}
