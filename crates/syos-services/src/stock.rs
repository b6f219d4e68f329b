//! # Locked Stock Adjustment
//!
//! The one primitive through which stock quantities change, shared by
//! manual adjustments (`InventoryService::update_stock`) and by sale
//! creation and cancellation.
//!
//! ```text
//! caller's open transaction
//!      │
//!      ▼
//! lock_for_update(code) ──► None ──► ProductNotFound
//!      │
//!      ▼
//! plan_stock_change ──────► InsufficientStock (nothing written)
//!      │
//!      ▼
//! write_stock(.., version) ─► None ──► ConcurrencyConflict
//!      │
//!      ▼
//! Product as stored (version + 1)
//! ```
//!
//! The caller owns the transaction: it commits on success, and dropping it
//! on any error rolls every adjustment in it back.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};
use syos_core::{Product, StockChangeType};
use syos_db::repository::product::{lock_for_update, write_stock};

/// Row-locks `code`, applies `change` of `quantity` units and writes it
/// back version-checked.
pub async fn adjust_locked(
    conn: &mut SqliteConnection,
    code: &str,
    change: StockChangeType,
    quantity: i64,
    today: NaiveDate,
) -> ServiceResult<Product> {
    let locked = lock_for_update(&mut *conn, code)
        .await?
        .ok_or_else(|| ServiceError::ProductNotFound(code.to_string()))?;

    let (levels, state) = locked.plan_stock_change(change, quantity, today)?;

    let written = write_stock(&mut *conn, code, levels, state, locked.version)
        .await?
        .ok_or_else(|| {
            warn!(code = %code, version = locked.version, "Version check failed under row lock");
            ServiceError::ConcurrencyConflict {
                code: code.to_string(),
            }
        })?;

    debug!(
        code = %code,
        change = change.as_str(),
        quantity,
        in_store = written.quantity_in_store,
        on_shelf = written.quantity_on_shelf,
        version = written.version,
        "Stock adjusted"
    );

    Ok(written)
}
