//! # Application Context
//!
//! Builds the process-wide service handles once at startup.
//!
//! ```text
//! SyosConfig ──► Database::new (migrations) ──► InventoryService::start
//!                                                  │ (cache warmed)
//!                                                  ▼
//!                                 SalesService { inventory, SaleNumberGenerator }
//! ```
//!
//! CLI and web handlers receive clones of the `Arc`s; nothing is a global.

use std::sync::Arc;

use tracing::info;

use crate::config::SyosConfig;
use crate::error::ServiceResult;
use crate::inventory::InventoryService;
use crate::sale_number::SaleNumberGenerator;
use crate::sales::SalesService;
use syos_db::Database;

/// The shared coordinators of one process.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db: Database,
    pub inventory: Arc<InventoryService>,
    pub sales: Arc<SalesService>,
}

impl AppContext {
    /// Opens the store described by `config` and wires the services.
    pub async fn bootstrap(config: &SyosConfig) -> ServiceResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        Self::with_database(db, config).await
    }

    /// Wires the services around an already opened store.
    pub async fn with_database(db: Database, config: &SyosConfig) -> ServiceResult<Self> {
        let inventory = Arc::new(
            InventoryService::start(db.clone(), config.cache_lock_timeout()).await?,
        );
        let numbers = SaleNumberGenerator::new(db.clone(), config.sale_number_lock_timeout());
        let sales = Arc::new(SalesService::new(
            db.clone(),
            Arc::clone(&inventory),
            numbers,
            config.tax_rate(),
        ));

        info!(
            tax_rate_bps = config.sales.tax_rate_bps,
            "Application context ready"
        );

        Ok(AppContext {
            db,
            inventory,
            sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::product;
    use syos_core::{SaleDraft, SaleLine};

    #[tokio::test]
    async fn test_bootstrap_from_config_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SyosConfig::default();
        config.database.path = dir.path().join("shop.db");
        config.sales.tax_rate_bps = 500;

        let ctx = AppContext::bootstrap(&config).await.unwrap();
        assert!(ctx.db.health_check().await);

        ctx.inventory
            .add_product(product("MILK", 200, 0, 4))
            .await
            .unwrap();
        let sale = ctx
            .sales
            .create_sale(SaleDraft::card(), &[SaleLine::new("MILK", 2)], "cashier-1")
            .await
            .unwrap();
        assert_eq!(sale.tax_cents, 20);
        assert_eq!(sale.total_cents, 420);

        ctx.db.close().await;
    }

    #[tokio::test]
    async fn test_bootstrap_warms_cache_from_existing_store() {
        let db = syos_db::Database::new(syos_db::DbConfig::in_memory())
            .await
            .unwrap();
        db.products().insert(&product("BREAD", 300, 1, 1)).await.unwrap();

        let ctx = AppContext::with_database(db, &SyosConfig::default())
            .await
            .unwrap();
        assert_eq!(ctx.inventory.get_all_products().await.unwrap().len(), 1);
        assert_eq!(ctx.inventory.cache_stats().reloads, 1);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_invalid_config() {
        let mut config = SyosConfig::default();
        config.database.max_connections = 0;
        assert!(AppContext::bootstrap(&config).await.is_err());
    }
}
