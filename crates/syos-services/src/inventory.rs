//! # Inventory Service
//!
//! Product reads and writes, fronted by the [`ProductCache`].
//!
//! ## Three Layers of Concurrency Control
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. RwLock<()> (tokio, fair)       in-process cache                     │
//! │     readers share, writers exclusive, every wait bounded → LockTimeout  │
//! │                                                                         │
//! │  2. version column                 logical edits (update_product)       │
//! │     submitted.version == cached.version, then                           │
//! │     UPDATE ... WHERE code = ? AND version = ?                           │
//! │     either check failing → OptimisticLockConflict                       │
//! │                                                                         │
//! │  3. row lock in a transaction      stock arithmetic (update_stock)      │
//! │     see crate::stock::adjust_locked                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache only ever receives rows the store returned, so the cached
//! version is always the authoritative one at the time of the write.
//!
//! ## Read-Miss Fill
//! ```text
//! get_product(code)
//!   read lock ─► cache hit ─► copy
//!      │ miss
//!   release read lock
//!   store lookup ─► None ─► Ok(None)
//!      │ Some
//!   write lock ─► fill_if_absent ─► copy
//! ```
//! A product deleted between the store lookup and the fill can be cached
//! again; the next `refresh_cache` drops it.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ProductCache};
use crate::error::{ServiceError, ServiceResult};
use crate::stock::adjust_locked;
use syos_core::validation::{validate_product, validate_product_code, validate_quantity};
use syos_core::{Product, StockChangeType};
use syos_db::{Database, DbError};

const CACHE_RESOURCE: &str = "product cache";

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Coordinates every product read and write in the process.
///
/// Construct once with [`InventoryService::start`] and share the handle.
#[derive(Debug)]
pub struct InventoryService {
    db: Database,
    cache: ProductCache,
    lock: RwLock<()>,
    lock_timeout: Duration,
}

impl InventoryService {
    /// Creates the service with an empty cache.
    pub fn new(db: Database, lock_timeout: Duration) -> Self {
        InventoryService {
            db,
            cache: ProductCache::new(),
            lock: RwLock::new(()),
            lock_timeout,
        }
    }

    /// Creates the service and loads every product into the cache.
    pub async fn start(db: Database, lock_timeout: Duration) -> ServiceResult<Self> {
        let service = Self::new(db, lock_timeout);
        service.refresh_cache().await?;
        info!(products = service.cache.len(), "Inventory service started");
        Ok(service)
    }

    async fn read_guard(&self) -> ServiceResult<RwLockReadGuard<'_, ()>> {
        tokio::time::timeout(self.lock_timeout, self.lock.read())
            .await
            .map_err(|_| {
                let err = ServiceError::lock_timeout(CACHE_RESOURCE, self.lock_timeout);
                warn!(error = %err, "Cache read lock timed out");
                err
            })
    }

    async fn write_guard(&self) -> ServiceResult<RwLockWriteGuard<'_, ()>> {
        tokio::time::timeout(self.lock_timeout, self.lock.write())
            .await
            .map_err(|_| {
                let err = ServiceError::lock_timeout(CACHE_RESOURCE, self.lock_timeout);
                warn!(error = %err, "Cache write lock timed out");
                err
            })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copies of every cached product, ordered by code.
    pub async fn get_all_products(&self) -> ServiceResult<Vec<Product>> {
        let _guard = self.read_guard().await?;
        Ok(self.cache.values())
    }

    /// One product by code, filling the cache from the store on a miss.
    ///
    /// ## Returns
    /// * `Ok(None)` - Neither the cache nor the store knows the code
    pub async fn get_product(&self, code: &str) -> ServiceResult<Option<Product>> {
        {
            let _guard = self.read_guard().await?;
            if let Some(product) = self.cache.get(code) {
                return Ok(Some(product));
            }
        }

        debug!(code = %code, "Cache miss, loading from store");
        let Some(loaded) = self.db.products().get_by_code(code).await? else {
            return Ok(None);
        };

        let _guard = self.write_guard().await?;
        Ok(Some(self.cache.fill_if_absent(loaded)))
    }

    /// Products whose total stock is at or below their reorder level.
    pub async fn get_low_stock_products(&self) -> ServiceResult<Vec<Product>> {
        let _guard = self.read_guard().await?;
        Ok(self
            .cache
            .values()
            .into_iter()
            .filter(Product::needs_reorder)
            .collect())
    }

    /// Products in `category`, compared case-insensitively.
    pub async fn get_products_by_category(&self, category: &str) -> ServiceResult<Vec<Product>> {
        let wanted = category.trim();
        let _guard = self.read_guard().await?;
        Ok(self
            .cache
            .values()
            .into_iter()
            .filter(|p| p.category.eq_ignore_ascii_case(wanted))
            .collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Adds a new product at version 0.
    ///
    /// ## Errors
    /// * `DuplicateProduct` - the code is cached or already stored
    pub async fn add_product(&self, product: Product) -> ServiceResult<Product> {
        validate_product(&product)?;

        let _guard = self.write_guard().await?;
        if self.cache.contains(&product.code) {
            return Err(ServiceError::DuplicateProduct(product.code));
        }

        let now = Utc::now();
        let mut product = product;
        product.version = 0;
        product.refresh_state(today());
        product.created_at = now;
        product.updated_at = now;

        let stored = match self.db.products().insert(&product).await {
            Ok(stored) => stored,
            Err(DbError::UniqueViolation { .. }) => {
                return Err(ServiceError::DuplicateProduct(product.code));
            }
            Err(e) => return Err(e.into()),
        };

        info!(code = %stored.code, "Product added");
        self.cache.put(stored.clone());
        Ok(stored)
    }

    /// Replaces a product's editable fields if `product.version` is current.
    ///
    /// On success the returned product carries `version + 1`.
    ///
    /// ## Errors
    /// * `OptimisticLockConflict` - the submitted version is stale; re-fetch
    ///   and resubmit
    /// * `ProductNotFound` - no such code in the store
    pub async fn update_product(&self, product: Product) -> ServiceResult<Product> {
        validate_product(&product)?;

        let _guard = self.write_guard().await?;
        let code = product.code.clone();

        let current = match self.cache.cached_version(&code) {
            Some(version) => version,
            None => {
                let loaded = self
                    .db
                    .products()
                    .get_by_code(&code)
                    .await?
                    .ok_or_else(|| ServiceError::ProductNotFound(code.clone()))?;
                self.cache.fill_if_absent(loaded).version
            }
        };

        if product.version != current {
            debug!(code = %code, submitted = product.version, current, "Stale product update");
            return Err(ServiceError::OptimisticLockConflict {
                code,
                submitted: product.version,
                current,
            });
        }

        let mut product = product;
        product.refresh_state(today());

        match self.db.products().update_versioned(&product, current).await? {
            Some(stored) => {
                info!(code = %code, version = stored.version, "Product updated");
                self.cache.put(stored.clone());
                Ok(stored)
            }
            None => {
                // The store moved on without this process noticing
                let fresh = self.db.products().get_by_code(&code).await?;
                match fresh {
                    Some(fresh) => {
                        warn!(code = %code, cached = current, stored = fresh.version, "Cache was behind the store");
                        let stored_version = fresh.version;
                        self.cache.put(fresh);
                        Err(ServiceError::OptimisticLockConflict {
                            code,
                            submitted: product.version,
                            current: stored_version,
                        })
                    }
                    None => {
                        self.cache.remove(&code);
                        Err(ServiceError::ProductNotFound(code))
                    }
                }
            }
        }
    }

    /// Applies a manual stock change under a row lock.
    ///
    /// ## Errors
    /// * `InsufficientStock` - the change would drive a quantity negative
    /// * `ProductNotFound` - no such code in the store
    /// * `Store(DbError::Locked)` - the row lock wait exceeded `busy_timeout`
    pub async fn update_stock(
        &self,
        code: &str,
        quantity: i64,
        change: StockChangeType,
    ) -> ServiceResult<Product> {
        validate_product_code(code)?;
        validate_quantity(quantity)?;

        let _guard = self.write_guard().await?;

        let mut tx = self.db.pool().begin().await?;
        let written = adjust_locked(&mut *tx, code, change, quantity, today()).await?;
        tx.commit().await?;

        info!(
            code = %code,
            change = change.as_str(),
            quantity,
            on_shelf = written.quantity_on_shelf,
            in_store = written.quantity_in_store,
            "Stock updated"
        );
        self.cache.put(written.clone());
        Ok(written)
    }

    /// Deletes a product from the store, then from the cache.
    ///
    /// Returns `false` if the store had no such product.
    pub async fn delete_product(&self, code: &str) -> ServiceResult<bool> {
        let _guard = self.write_guard().await?;

        let deleted = self.db.products().delete(code).await?;
        self.cache.remove(code);

        if deleted {
            info!(code = %code, "Product deleted");
        }
        Ok(deleted)
    }

    /// Reloads the whole cache from the store.
    pub async fn refresh_cache(&self) -> ServiceResult<()> {
        let _guard = self.write_guard().await?;
        let products = self.db.products().list_all().await?;
        debug!(count = products.len(), "Reloading product cache");
        self.cache.load(products);
        Ok(())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
