//! Fixtures shared by the service tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tempfile::TempDir;

use syos_core::{Product, ProductState};
use syos_db::{Database, DbConfig};

use crate::inventory::InventoryService;
use crate::sales::SalesService;
use crate::sale_number::SaleNumberGenerator;
use syos_core::TaxRate;

pub(crate) const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A product with the given stock, ready for `add_product`.
pub(crate) fn product(code: &str, price_cents: i64, in_store: i64, on_shelf: i64) -> Product {
    let now = Utc::now();
    Product {
        code: code.to_string(),
        name: format!("{code} item"),
        category: "Grocery".to_string(),
        unit_price_cents: price_cents,
        quantity_in_store: in_store,
        quantity_on_shelf: on_shelf,
        reorder_level: 5,
        state: ProductState::Available,
        purchase_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        expiry_date: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Single-connection in-memory store.
pub(crate) async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File-backed store with a real pool, for tests that need concurrent
/// transactions. Keep the `TempDir` alive for the length of the test.
pub(crate) async fn file_db(connections: u32) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(
        DbConfig::new(dir.path().join("syos-test.db"))
            .max_connections(connections)
            .busy_timeout(Duration::from_secs(30)),
    )
    .await
    .unwrap();
    (dir, db)
}

pub(crate) async fn inventory(db: &Database) -> Arc<InventoryService> {
    Arc::new(
        InventoryService::start(db.clone(), LOCK_TIMEOUT)
            .await
            .unwrap(),
    )
}

pub(crate) fn sales(db: &Database, inventory: &Arc<InventoryService>, tax: TaxRate) -> SalesService {
    SalesService::new(
        db.clone(),
        Arc::clone(inventory),
        SaleNumberGenerator::new(db.clone(), LOCK_TIMEOUT),
        tax,
    )
}
