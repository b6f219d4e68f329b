//! # syos-core: Pure Business Logic for SYOS
//!
//! Domain types and rules for the SYOS point-of-sale transaction core.
//! Everything here is deterministic and free of I/O; locking, caching and
//! persistence live in `syos-db` and `syos-services`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SYOS Architecture                              │
//! │                                                                         │
//! │  CLI commands / web servlets (external callers)                         │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │  syos-services: InventoryService, SalesService, ProductCache    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ syos-core (THIS CRATE) ★                        │   │
//! │  │   types  │  stock  │  totals  │  money  │  validation           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    syos-db (SQLite store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Sale, SaleItem and their enums
//! - [`stock`] - Stock level arithmetic per change type
//! - [`totals`] - Sale totals, tax and change calculation
//! - [`money`] - Integer money
//! - [`report`] - Read-only report rows
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use syos_core::money::Money;
//! use syos_core::types::TaxRate;
//!
//! let price = Money::from_cents(1099);
//! let tax = price.calculate_tax(TaxRate::from_bps(825));
//! assert_eq!(tax.cents(), 91);
//! ```

pub mod error;
pub mod money;
pub mod report;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use report::{DailySalesReport, ProductSales, SalesStatistics};
pub use stock::StockLevels;
pub use totals::SaleTotals;
pub use types::*;

/// Lines accepted in a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Upper bound for one sale line or one stock adjustment; catches a
/// mistyped 1000 for 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Highest unit price accepted, in cents. With [`MAX_ITEM_QUANTITY`] and
/// [`MAX_SALE_LINES`] a sale subtotal stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Highest store-room, shelf or reorder figure a product may hold.
pub const MAX_STOCK_FIGURE: i64 = 1_000_000_000;
