//! # Domain Types
//!
//! Core domain types used throughout SYOS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │     Product      │   │       Sale       │   │     SaleItem     │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  code (PK)       │   │  id (UUID)       │   │  sale_id (FK)    │    │
//! │  │  store / shelf   │   │  sale_number     │   │  product_code    │    │
//! │  │  reorder_level   │   │  status          │   │  name snapshot   │    │
//! │  │  state           │   │  totals          │   │  price snapshot  │    │
//! │  │  version         │   │  version         │   │  quantity        │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                                         │
//! │  ProductState      SaleStatus          PaymentMethod   StockChangeType  │
//! │  AVAILABLE         PENDING ─┐          CASH            ADD_STORE ...    │
//! │  ON_SHELF          COMPLETED ◄┘        CARD            SALE             │
//! │  SOLD_OUT          CANCELLED ◄── COMPLETED                              │
//! │  EXPIRED                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every struct here is a plain value: cloning a `Product` out of the cache
//! hands the caller an independent copy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::stock::StockLevels;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (825 = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product State
// =============================================================================

/// Lifecycle state of a product, derived from its stock and expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductState {
    /// In the store room but nothing on the shelf.
    Available,
    /// At least one unit on the shelf.
    OnShelf,
    /// No units anywhere.
    SoldOut,
    /// Past its expiry date, regardless of stock.
    Expired,
}

impl ProductState {
    /// Derives the state from stock levels and expiry.
    ///
    /// ```text
    /// expiry < today ─────────────► EXPIRED
    /// on_shelf > 0 ───────────────► ON_SHELF
    /// in_store > 0 ───────────────► AVAILABLE
    /// otherwise ──────────────────► SOLD_OUT
    /// ```
    pub fn derive(levels: StockLevels, expiry_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        if matches!(expiry_date, Some(expiry) if expiry < today) {
            ProductState::Expired
        } else if levels.on_shelf > 0 {
            ProductState::OnShelf
        } else if levels.in_store > 0 {
            ProductState::Available
        } else {
            ProductState::SoldOut
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductState::Available => "AVAILABLE",
            ProductState::OnShelf => "ON_SHELF",
            ProductState::SoldOut => "SOLD_OUT",
            ProductState::Expired => "EXPIRED",
        }
    }
}

// =============================================================================
// Stock Change Type
// =============================================================================

/// The kind of stock movement requested by a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockChangeType {
    /// Delivery into the store room.
    AddStore,
    /// Write-off from the store room.
    RemoveStore,
    /// Direct restock onto the shelf (also used to reverse a sale).
    AddShelf,
    /// Write-off from the shelf.
    RemoveShelf,
    /// Transfer from store room to shelf.
    MoveToShelf,
    /// Units leaving the shelf through a sale.
    Sale,
}

impl StockChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChangeType::AddStore => "ADD_STORE",
            StockChangeType::RemoveStore => "REMOVE_STORE",
            StockChangeType::AddShelf => "ADD_SHELF",
            StockChangeType::RemoveShelf => "REMOVE_SHELF",
            StockChangeType::MoveToShelf => "MOVE_TO_SHELF",
            StockChangeType::Sale => "SALE",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product, identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Business identifier, unique across the store.
    pub code: String,

    /// Display name shown to cashier and on the bill.
    pub name: String,

    pub category: String,

    /// Price in cents.
    pub unit_price_cents: i64,

    /// Units in the store room.
    pub quantity_in_store: i64,

    /// Units on the shelf, available for sale.
    pub quantity_on_shelf: i64,

    /// Total stock at or below this level triggers a reorder.
    pub reorder_level: i64,

    pub state: ProductState,

    #[ts(as = "String")]
    pub purchase_date: NaiveDate,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Optimistic concurrency counter, +1 on every successful mutation.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Current store / shelf quantities.
    #[inline]
    pub fn levels(&self) -> StockLevels {
        StockLevels::new(self.quantity_in_store, self.quantity_on_shelf)
    }

    /// Total units held, store room plus shelf.
    #[inline]
    pub fn total_quantity(&self) -> i64 {
        self.quantity_in_store + self.quantity_on_shelf
    }

    /// `store + shelf <= reorder_level`.
    pub fn needs_reorder(&self) -> bool {
        self.total_quantity() <= self.reorder_level
    }

    pub fn is_sold_out(&self) -> bool {
        self.total_quantity() == 0
    }

    /// Re-derives `state` from the current quantities and expiry date.
    pub fn refresh_state(&mut self, today: NaiveDate) {
        self.state = ProductState::derive(self.levels(), self.expiry_date, today);
    }

    /// Computes the levels and state this product would have after a change.
    ///
    /// Does not mutate `self`; the caller persists the result and adopts the
    /// row the store returns.
    pub fn plan_stock_change(
        &self,
        change: StockChangeType,
        quantity: i64,
        today: NaiveDate,
    ) -> CoreResult<(StockLevels, ProductState)> {
        let levels = self.levels().apply(&self.code, change, quantity)?;
        let state = ProductState::derive(levels, self.expiry_date, today);
        Ok((levels, state))
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// PENDING only exists inside the creating transaction; committed sales are
/// COMPLETED or CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Completed => "COMPLETED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only completed sales may be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-readable number, `YYYYMMDD-NNNN`.
    pub sale_number: String,
    pub cashier_id: String,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub cash_tendered_cents: i64,
    pub change_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub version: i64,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Name and price are frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// 1-based position on the bill.
    pub line_no: i64,
    pub product_code: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Input
// =============================================================================

/// Header fields supplied by the till when creating a sale.
///
/// Everything else on the `Sale` (number, totals, status, timestamps) is
/// computed by the sale coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    pub payment_method: PaymentMethod,
    /// Flat discount in cents, 0..=subtotal.
    pub discount_cents: i64,
    /// Required for cash payments.
    pub cash_tendered_cents: Option<i64>,
}

impl SaleDraft {
    pub fn cash(tendered_cents: i64) -> Self {
        Self {
            payment_method: PaymentMethod::Cash,
            discount_cents: 0,
            cash_tendered_cents: Some(tendered_cents),
        }
    }

    pub fn card() -> Self {
        Self {
            payment_method: PaymentMethod::Card,
            discount_cents: 0,
            cash_tendered_cents: None,
        }
    }

    pub fn with_discount(mut self, discount_cents: i64) -> Self {
        self.discount_cents = discount_cents;
        self
    }
}

/// One requested line: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_code: String,
    pub quantity: i64,
}

impl SaleLine {
    pub fn new(product_code: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale Number
// =============================================================================

/// Formats a sale number as `YYYYMMDD-NNNN`.
pub fn format_sale_number(date: NaiveDate, sequence: i64) -> String {
    format!("{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// Prefix shared by every sale number issued on `date`, e.g. `20261019-`.
pub fn sale_number_prefix(date: NaiveDate) -> String {
    format!("{}-", date.format("%Y%m%d"))
}

/// Parses the sequence part of a sale number.
pub fn parse_sale_sequence(sale_number: &str) -> Option<i64> {
    let (_, seq) = sale_number.split_once('-')?;
    seq.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
