//! # syos-services: Inventory and Sale Coordinators
//!
//! The concurrent core of SYOS: a product cache behind a fair read/write
//! lock, optimistic versioning for product edits, and row-locked
//! transactions for every stock movement.
//!
//! ## Module Organization
//!
//! - [`cache`] - Product cache (defensive copies, hit/miss counters)
//! - [`inventory`] - `InventoryService`: product reads, edits, stock changes
//! - [`sales`] - `SalesService`: create / cancel sales, reports
//! - [`sale_number`] - Per-day sale number sequence under a bounded mutex
//! - [`stock`] - Row-locked stock adjustment shared by both services
//! - [`config`] - `SyosConfig` (TOML + environment)
//! - [`context`] - `AppContext`: one set of service handles per process
//! - [`error`] - `ServiceError` taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use syos_core::{SaleDraft, SaleLine};
//! use syos_services::{init_tracing, AppContext, SyosConfig};
//!
//! init_tracing();
//! let config = SyosConfig::load(None)?;
//! let ctx = AppContext::bootstrap(&config).await?;
//!
//! let sale = ctx
//!     .sales
//!     .create_sale(SaleDraft::cash(2000), &[SaleLine::new("MILK-1L", 2)], "cashier-7")
//!     .await?;
//! ```

use tracing_subscriber::EnvFilter;

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod inventory;
pub mod sale_number;
pub mod sales;
pub mod stock;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, ProductCache};
pub use config::SyosConfig;
pub use context::AppContext;
pub use error::{ServiceError, ServiceResult};
pub use inventory::InventoryService;
pub use sale_number::SaleNumberGenerator;
pub use sales::SalesService;

/// Installs the global tracing subscriber.
///
/// Uses `RUST_LOG` when set, otherwise `info,syos=debug,sqlx=warn`.
/// Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,syos=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
