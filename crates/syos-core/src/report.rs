//! # Report Rows
//!
//! Read-only aggregates over persisted sales. Revenue figures only count
//! COMPLETED sales; cancelled sales are reported as a separate count.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Totals for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySalesReport {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Completed sales.
    pub sale_count: i64,
    pub cancelled_count: i64,
    /// Units sold across completed sales.
    pub items_sold: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub revenue_cents: i64,
}

impl DailySalesReport {
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

/// Sales summary over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesStatistics {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub sale_count: i64,
    pub cancelled_count: i64,
    pub revenue_cents: i64,
    /// Integer average, 0 when there are no sales.
    pub average_sale_cents: i64,
    pub largest_sale_cents: i64,
}

/// Quantity and revenue per product over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSales {
    pub product_code: String,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}
