//! # Sale Repository
//!
//! Store operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  ── one transaction ─────────────────────────────────────────────────   │
//! │  1. insert_pending()   → Sale { status: PENDING }                       │
//! │  2. insert_item() × n  → SaleItem (line_no 1..n)                        │
//! │  3. mark_completed()   → Sale { status: COMPLETED }                     │
//! │  ── commit ──────────────────────────────────────────────────────────   │
//! │                                                                         │
//! │  ── later, one transaction ──────────────────────────────────────────   │
//! │  4. lock_sale()        → row lock + current header                      │
//! │  5. mark_cancelled()   → Sale { status: CANCELLED }, version + 1        │
//! │  ── commit ──────────────────────────────────────────────────────────   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use syos_core::{sale_number_prefix, Sale, SaleItem};

/// Repository for sale lookups outside of a transaction.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its human-readable number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE sale_number = ?1")
            .bind(sale_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in bill order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Highest sequence number already issued on `date`, or 0.
    pub async fn max_sequence_for_day(&self, date: NaiveDate) -> DbResult<i64> {
        let pattern = format!("{}%", sale_number_prefix(date));

        // sale_number is YYYYMMDD-NNNN; the sequence starts at character 10
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(CAST(substr(sale_number, 10) AS INTEGER)) FROM sales WHERE sale_number LIKE ?1",
        )
        .bind(pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(max.unwrap_or(0))
    }

    /// Counts sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Statements
// =============================================================================

/// Inserts a sale header as given (expected to be PENDING).
pub async fn insert_pending(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, cashier_id, status, payment_method,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            cash_tendered_cents, change_cents,
            created_at, updated_at, completed_at, cancelled_at, cancelled_by, version
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(&sale.cashier_id)
    .bind(sale.status)
    .bind(sale.payment_method)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.cash_tendered_cents)
    .bind(sale.change_cents)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.completed_at)
    .bind(sale.cancelled_at)
    .bind(&sale.cancelled_by)
    .bind(sale.version)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one sale line.
pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, line_no, product_code, product_name,
            unit_price_cents, quantity, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.line_no)
    .bind(&item.product_code)
    .bind(&item.product_name)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Flips a PENDING sale to COMPLETED.
///
/// ## Returns
/// * `Ok(None)` - No PENDING sale with that id
pub async fn mark_completed(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Option<Sale>> {
    let now = Utc::now();

    let sale = sqlx::query_as::<_, Sale>(
        r#"
        UPDATE sales SET
            status = 'COMPLETED',
            completed_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(sale_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Row-locks a sale inside the caller's transaction and returns it.
pub async fn lock_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        "UPDATE sales SET version = version WHERE id = ?1 RETURNING *",
    )
    .bind(sale_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Items of a sale, read on the caller's transaction.
pub async fn items_for_sale(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Flips a COMPLETED sale to CANCELLED, guarded by `expected_version`.
///
/// ## Returns
/// * `Ok(None)` - Sale moved on (status or version) since it was locked
pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    sale_id: &str,
    cancelled_by: &str,
    expected_version: i64,
) -> DbResult<Option<Sale>> {
    let now = Utc::now();

    let sale = sqlx::query_as::<_, Sale>(
        r#"
        UPDATE sales SET
            status = 'CANCELLED',
            cancelled_at = ?3,
            cancelled_by = ?4,
            updated_at = ?3,
            version = version + 1
        WHERE id = ?1 AND version = ?2 AND status = 'COMPLETED'
        RETURNING *
        "#,
    )
    .bind(sale_id)
    .bind(expected_version)
    .bind(now)
    .bind(cancelled_by)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use chrono::DateTime;
    use syos_core::{format_sale_number, PaymentMethod, SaleStatus};
    use uuid::Uuid;

    pub(crate) fn pending_sale(sale_number: &str, total: i64, created_at: DateTime<Utc>) -> Sale {
        Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: sale_number.to_string(),
            cashier_id: "cashier-1".to_string(),
            status: SaleStatus::Pending,
            payment_method: PaymentMethod::Cash,
            subtotal_cents: total,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: total,
            cash_tendered_cents: total,
            change_cents: 0,
            created_at,
            updated_at: created_at,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            version: 0,
        }
    }

    pub(crate) fn item(sale_id: &str, line_no: i64, code: &str, price: i64, qty: i64) -> SaleItem {
        SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            line_no,
            product_code: code.to_string(),
            product_name: format!("{code} name"),
            unit_price_cents: price,
            quantity: qty,
            subtotal_cents: price * qty,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pending_to_completed_to_cancelled() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = pending_sale("20261019-0001", 500, Utc::now());

        let mut tx = db.pool().begin().await.unwrap();
        insert_pending(&mut *tx, &sale).await.unwrap();
        insert_item(&mut *tx, &item(&sale.id, 1, "BREAD", 250, 2)).await.unwrap();
        let completed = mark_completed(&mut *tx, &sale.id).await.unwrap().unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);
        assert!(completed.completed_at.is_some());
        // Already completed: nothing to flip
        assert!(mark_completed(&mut *tx, &sale.id).await.unwrap().is_none());
        tx.commit().await.unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal_cents, 500);

        let mut tx = db.pool().begin().await.unwrap();
        let locked = lock_sale(&mut *tx, &sale.id).await.unwrap().unwrap();
        let cancelled = mark_cancelled(&mut *tx, &sale.id, "manager-7", locked.version)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("manager-7"));
        assert_eq!(cancelled.version, locked.version + 1);
        // Second flip fails the status guard
        assert!(mark_cancelled(&mut *tx, &sale.id, "manager-7", cancelled.version)
            .await
            .unwrap()
            .is_none());
        tx.commit().await.unwrap();

        let reloaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(reloaded, cancelled);
    }

    #[tokio::test]
    async fn test_max_sequence_for_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(db.sales().max_sequence_for_day(day).await.unwrap(), 0);

        let mut tx = db.pool().begin().await.unwrap();
        for seq in [1, 2, 12] {
            let sale = pending_sale(&format_sale_number(day, seq), 100, Utc::now());
            insert_pending(&mut *tx, &sale).await.unwrap();
        }
        let other_day = pending_sale("20261018-0099", 100, Utc::now());
        insert_pending(&mut *tx, &other_day).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.sales().max_sequence_for_day(day).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_duplicate_sale_number_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        insert_pending(&mut *conn, &pending_sale("20261019-0001", 1, Utc::now()))
            .await
            .unwrap();
        let err = insert_pending(&mut *conn, &pending_sale("20261019-0001", 1, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_sale_lookups() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().get_by_id("missing").await.unwrap().is_none());
        assert!(db.sales().get_by_number("missing").await.unwrap().is_none());
        assert!(db.sales().get_items("missing").await.unwrap().is_empty());
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }
}
