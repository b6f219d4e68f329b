//! # Product Repository
//!
//! Store operations for products.
//!
//! ## Key Operations
//! - Lookup by code and bulk listing (cache loads, miss-fills)
//! - Admin insert / version-guarded update / delete
//! - Transaction-scoped row lock and version-guarded stock write
//!
//! ## Row Locking on SQLite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT ... FOR UPDATE. The transactional equivalent:     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │  UPDATE products SET version = version WHERE code = ? RETURNING *       │
//! │     │                                                                   │
//! │     ├── takes the database write lock (held until COMMIT / ROLLBACK)    │
//! │     └── returns the current row, read under that lock                   │
//! │                                                                         │
//! │  UPDATE products SET ..., version = version + 1                         │
//! │   WHERE code = ? AND version = ? RETURNING *                            │
//! │     │                                                                   │
//! │     └── no row back ⇒ the version moved under us ⇒ conflict             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use syos_core::{Product, ProductState, StockLevels};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let all = repo.list_all().await?;
/// let milk = repo.get_by_code("MILK-1L").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists every product ordered by code.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY code")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Inserts a new product and returns the stored row.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(code = %product.code, "Inserting product");

        let stored = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                code, name, category, unit_price_cents,
                quantity_in_store, quantity_on_shelf, reorder_level, state,
                purchase_date, expiry_date, version, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13
            )
            RETURNING *
            "#,
        )
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.unit_price_cents)
        .bind(product.quantity_in_store)
        .bind(product.quantity_on_shelf)
        .bind(product.reorder_level)
        .bind(product.state)
        .bind(product.purchase_date)
        .bind(product.expiry_date)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Replaces every editable field of a product, guarded by its version.
    ///
    /// The row is only written when its stored version equals
    /// `expected_version`; the stored version then becomes
    /// `expected_version + 1`.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Row written, as stored
    /// * `Ok(None)` - Missing row or version mismatch
    pub async fn update_versioned(
        &self,
        product: &Product,
        expected_version: i64,
    ) -> DbResult<Option<Product>> {
        debug!(code = %product.code, expected_version, "Updating product");

        let stored = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?3,
                category = ?4,
                unit_price_cents = ?5,
                quantity_in_store = ?6,
                quantity_on_shelf = ?7,
                reorder_level = ?8,
                state = ?9,
                purchase_date = ?10,
                expiry_date = ?11,
                updated_at = ?12,
                version = version + 1
            WHERE code = ?1 AND version = ?2
            RETURNING *
            "#,
        )
        .bind(&product.code)
        .bind(expected_version)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.unit_price_cents)
        .bind(product.quantity_in_store)
        .bind(product.quantity_on_shelf)
        .bind(product.reorder_level)
        .bind(product.state)
        .bind(product.purchase_date)
        .bind(product.expiry_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Deletes a product. Returns `false` if no row had that code.
    pub async fn delete(&self, code: &str) -> DbResult<bool> {
        debug!(code = %code, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Statements
// =============================================================================

/// Row-locks a product inside the caller's transaction and returns it.
///
/// Blocks for up to the connection's `busy_timeout` while another
/// transaction holds the write lock, then fails with `DbError::Locked`.
///
/// ## Returns
/// * `Ok(None)` - No product with that code
pub async fn lock_for_update(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET version = version WHERE code = ?1 RETURNING *",
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Writes new stock levels and state, guarded by `expected_version`.
///
/// ## Returns
/// * `Ok(Some(Product))` - Row written; version is `expected_version + 1`
/// * `Ok(None)` - Version mismatch (or the write was suppressed)
pub async fn write_stock(
    conn: &mut SqliteConnection,
    code: &str,
    levels: StockLevels,
    state: ProductState,
    expected_version: i64,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products SET
            quantity_in_store = ?3,
            quantity_on_shelf = ?4,
            state = ?5,
            updated_at = ?6,
            version = version + 1
        WHERE code = ?1 AND version = ?2
        RETURNING *
        "#,
    )
    .bind(code)
    .bind(expected_version)
    .bind(levels.in_store)
    .bind(levels.on_shelf)
    .bind(state)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================
