//! # Report Repository
//!
//! Read-only aggregates over persisted sales. No locks, no transactions:
//! each query reads a WAL snapshot.
//!
//! Revenue counts COMPLETED sales only. Days are UTC calendar days.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use syos_core::{DailySalesReport, ProductSales, SalesStatistics};

/// `[from 00:00, to + 1 day 00:00)` in UTC.
fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::default()));
    let end = Utc.from_utc_datetime(&(to + Duration::days(1)).and_time(NaiveTime::default()));
    (start, end)
}

/// Repository for sales reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Totals for one day.
    pub async fn daily(&self, date: NaiveDate) -> DbResult<DailySalesReport> {
        let (start, end) = day_bounds(date, date);
        debug!(%date, "Building daily sales report");

        let (sale_count, subtotal, discount, tax, revenue): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(subtotal_cents), 0),
                    COALESCE(SUM(discount_cents), 0),
                    COALESCE(SUM(tax_cents), 0),
                    COALESCE(SUM(total_cents), 0)
                FROM sales
                WHERE status = 'COMPLETED' AND created_at >= ?1 AND created_at < ?2
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        let items_sold: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity), 0)
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'COMPLETED' AND s.created_at >= ?1 AND s.created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let cancelled_count = self.cancelled_between(start, end).await?;

        Ok(DailySalesReport {
            date,
            sale_count,
            cancelled_count,
            items_sold,
            subtotal_cents: subtotal,
            discount_cents: discount,
            tax_cents: tax,
            revenue_cents: revenue,
        })
    }

    /// Summary over an inclusive date range.
    pub async fn statistics(&self, from: NaiveDate, to: NaiveDate) -> DbResult<SalesStatistics> {
        let (start, end) = day_bounds(from, to);
        debug!(%from, %to, "Building sales statistics");

        let (sale_count, revenue, largest): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(total_cents), 0),
                COALESCE(MAX(total_cents), 0)
            FROM sales
            WHERE status = 'COMPLETED' AND created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let cancelled_count = self.cancelled_between(start, end).await?;
        let average = if sale_count > 0 { revenue / sale_count } else { 0 };

        Ok(SalesStatistics {
            from,
            to,
            sale_count,
            cancelled_count,
            revenue_cents: revenue,
            average_sale_cents: average,
            largest_sale_cents: largest,
        })
    }

    /// Best sellers by quantity over an inclusive date range.
    ///
    /// Ties are broken by product code.
    pub async fn top_selling(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> DbResult<Vec<ProductSales>> {
        let (start, end) = day_bounds(from, to);

        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                si.product_code AS product_code,
                MAX(si.product_name) AS product_name,
                SUM(si.quantity) AS quantity_sold,
                SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'COMPLETED' AND s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY si.product_code
            ORDER BY quantity_sold DESC, si.product_code ASC
            LIMIT ?3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn cancelled_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE status = 'CANCELLED' AND created_at >= ?1 AND created_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
