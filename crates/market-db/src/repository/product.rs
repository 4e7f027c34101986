//! # Product Repository
//!
//! Catalog rows keyed by product code.
//!
//! ```text
//! products
//! ┌──────┬──────────────┬──────────┬──────────────────┬──────────────┐
//! │ code │ name         │ category │ base_price_cents │ weekly_offer │
//! ├──────┼──────────────┼──────────┼──────────────────┼──────────────┤
//! │ P001 │ Coffee 500g  │ Grocery  │ 1000             │ 1            │
//! └──────┴──────────────┴──────────┴──────────────────┴──────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use market_core::{Money, Product};

/// Raw `products` row.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    code: String,
    name: String,
    category: String,
    base_price_cents: i64,
    weekly_offer: bool,
}

impl ProductRow {
    fn into_product(self) -> DbResult<Product> {
        Product::new(
            &self.code,
            &self.name,
            &self.category,
            Money::from_cents(self.base_price_cents),
            self.weekly_offer,
        )
        .map_err(|e| DbError::invalid_data(format!("product {}", self.code), e))
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, ordered by code.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, name, category, base_price_cents, weekly_offer
            FROM products
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded products");
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Gets a product by code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, code: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT code, name, category, base_price_cents, weekly_offer
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Inserts a product or updates the existing row with the same code.
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_on(&mut *conn, product).await
    }

    pub(crate) async fn upsert_on(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(code = %product.code(), "Upserting product");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (
                code, name, category, base_price_cents, weekly_offer, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                base_price_cents = excluded.base_price_cents,
                weekly_offer = excluded.weekly_offer,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product.code())
        .bind(product.name())
        .bind(product.category())
        .bind(product.base_price().cents())
        .bind(product.is_on_weekly_offer())
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes a product by code.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such product
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }

        Ok(())
    }

    /// Deletes every product whose code is not in `keep`.
    pub(crate) async fn retain_on(conn: &mut SqliteConnection, keep: &[&str]) -> DbResult<u64> {
        let existing: Vec<String> = sqlx::query_scalar("SELECT code FROM products")
            .fetch_all(&mut *conn)
            .await?;

        let mut removed = 0;
        for code in existing.iter().filter(|c| !keep.contains(&c.as_str())) {
            removed += sqlx::query("DELETE FROM products WHERE code = ?1")
                .bind(code)
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }
        Ok(removed)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
