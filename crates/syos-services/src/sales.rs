//! # Sales Service
//!
//! All-or-nothing creation and cancellation of sales, plus read-only
//! reporting.
//!
//! ## Sale Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         create_sale                                     │
//! │                                                                         │
//! │  validate lines, cashier                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale number ◄── SaleNumberGenerator (bounded mutex)                    │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────────┐   │
//! │  │  lock every product (code order), shelf ≥ Σ requested?           │   │
//! │  │       └── no ──► InsufficientStock ─────────────────► ROLLBACK   │   │
//! │  │  compute totals (discount, tax, tender)                          │   │
//! │  │  INSERT sale (PENDING)                                           │   │
//! │  │  for each line:                                                  │   │
//! │  │     INSERT sale_item (name / price snapshot)                     │   │
//! │  │     adjust_locked(SALE) ── version miss ──► ConcurrencyConflict  │   │
//! │  │  UPDATE sale → COMPLETED                                         │   │
//! │  COMMIT ────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  inventory.refresh_cache()   (failure logged, sale stands)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation is the compensating transaction: it puts every line's
//! quantity back on the shelf and flips the sale to CANCELLED, or changes
//! nothing at all.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::inventory::InventoryService;
use crate::sale_number::SaleNumberGenerator;
use crate::stock::adjust_locked;
use syos_core::validation::{validate_sale_lines, validate_user_id};
use syos_core::{
    CoreError, DailySalesReport, Product, ProductSales, Sale, SaleDraft, SaleItem, SaleLine, SaleStatus,
    SaleTotals, SalesStatistics, StockChangeType, TaxRate,
};
use syos_db::repository::product::lock_for_update;
use syos_db::repository::sale::{
    insert_item, insert_pending, items_for_sale, lock_sale, mark_cancelled, mark_completed,
};
use syos_db::{Database, DbError};

/// Creates and cancels sales.
///
/// Holds the shared inventory handle so the product cache can be refreshed
/// after every committed sale.
#[derive(Debug)]
pub struct SalesService {
    db: Database,
    inventory: Arc<InventoryService>,
    numbers: SaleNumberGenerator,
    tax_rate: TaxRate,
}

impl SalesService {
    pub fn new(
        db: Database,
        inventory: Arc<InventoryService>,
        numbers: SaleNumberGenerator,
        tax_rate: TaxRate,
    ) -> Self {
        SalesService {
            db,
            inventory,
            numbers,
            tax_rate,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Sells `lines` in one transaction and returns the COMPLETED sale.
    ///
    /// ## Errors
    /// * `InsufficientStock` - some product's shelf cannot cover its lines;
    ///   nothing is written
    /// * `ConcurrencyConflict` - a row-locked stock write missed its version
    /// * `Domain` - bad discount or cash tender
    /// * `LockTimeout` - sale-number mutex wait expired
    /// * `Store` - persistence failure (including row-lock wait timeout)
    pub async fn create_sale(
        &self,
        draft: SaleDraft,
        lines: &[SaleLine],
        cashier_id: &str,
    ) -> ServiceResult<Sale> {
        validate_sale_lines(lines)?;
        validate_user_id("cashier_id", cashier_id)?;

        let sale_number = self.numbers.next().await?;
        debug!(sale_number = %sale_number, lines = lines.len(), "Creating sale");

        let mut tx = self.db.pool().begin().await?;
        let sale = match self
            .write_sale(&mut *tx, &sale_number, &draft, lines, cashier_id)
            .await
        {
            Ok(sale) => sale,
            Err(e) => {
                warn!(sale_number = %sale_number, error = %e, "Sale rolled back");
                if let Err(rb) = tx.rollback().await {
                    error!(sale_number = %sale_number, error = %rb, "Rollback failed");
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total_cents = sale.total_cents,
            "Sale completed"
        );
        self.refresh_inventory(&sale.id).await;

        Ok(sale)
    }

    async fn write_sale(
        &self,
        conn: &mut SqliteConnection,
        sale_number: &str,
        draft: &SaleDraft,
        lines: &[SaleLine],
        cashier_id: &str,
    ) -> ServiceResult<Sale> {
        let mut requested: BTreeMap<&str, i64> = BTreeMap::new();
        for line in lines {
            *requested.entry(line.product_code.as_str()).or_insert(0) += line.quantity;
        }

        let mut locked: BTreeMap<&str, Product> = BTreeMap::new();
        for (&code, &quantity) in &requested {
            let product = lock_for_update(&mut *conn, code)
                .await?
                .ok_or_else(|| ServiceError::ProductNotFound(code.to_string()))?;

            if product.quantity_on_shelf < quantity {
                return Err(ServiceError::InsufficientStock {
                    code: code.to_string(),
                    requested: quantity,
                    available: product.quantity_on_shelf,
                });
            }
            locked.insert(code, product);
        }

        // Every line's product is in `locked` by construction
        let priced: Vec<(&SaleLine, &Product)> = lines
            .iter()
            .filter_map(|line| locked.get(line.product_code.as_str()).map(|p| (line, p)))
            .collect();

        let totals = SaleTotals::compute(
            priced
                .iter()
                .map(|(line, product)| (product.unit_price_cents, line.quantity)),
            draft,
            self.tax_rate,
        )?;

        let now = Utc::now();
        let today = now.date_naive();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: sale_number.to_string(),
            cashier_id: cashier_id.to_string(),
            status: SaleStatus::Pending,
            payment_method: draft.payment_method,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            cash_tendered_cents: totals.cash_tendered_cents,
            change_cents: totals.change_cents,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            version: 0,
        };
        insert_pending(&mut *conn, &sale).await?;

        for (index, (line, product)) in priced.iter().enumerate() {
            let line_total = product
                .unit_price()
                .multiply_quantity(line.quantity)
                .ok_or_else(|| CoreError::AmountOverflow {
                    field: format!("line {} subtotal", index + 1),
                })?;
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                line_no: index as i64 + 1,
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                unit_price_cents: product.unit_price_cents,
                quantity: line.quantity,
                subtotal_cents: line_total.cents(),
                created_at: now,
            };
            insert_item(&mut *conn, &item).await?;
            adjust_locked(
                &mut *conn,
                &line.product_code,
                StockChangeType::Sale,
                line.quantity,
                today,
            )
            .await?;
        }

        let completed = mark_completed(&mut *conn, &sale.id)
            .await?
            .ok_or_else(|| DbError::not_found("pending sale", sale.id.clone()))?;

        Ok(completed)
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// Cancels a COMPLETED sale and puts its stock back on the shelf.
    ///
    /// ## Returns
    /// * `Ok(true)` - Cancelled
    /// * `Ok(false)` - No such sale, or it is not COMPLETED; nothing changed
    pub async fn cancel_sale(&self, sale_id: &str, user_id: &str) -> ServiceResult<bool> {
        validate_user_id("user_id", user_id)?;

        let mut tx = self.db.pool().begin().await?;
        let cancelled = match self.reverse_sale(&mut *tx, sale_id, user_id).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                warn!(sale_id = %sale_id, error = %e, "Cancellation rolled back");
                if let Err(rb) = tx.rollback().await {
                    error!(sale_id = %sale_id, error = %rb, "Rollback failed");
                }
                return Err(e);
            }
        };

        let Some(sale) = cancelled else {
            tx.rollback().await?;
            return Ok(false);
        };
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            cancelled_by = %user_id,
            "Sale cancelled"
        );
        self.refresh_inventory(&sale.id).await;

        Ok(true)
    }

    async fn reverse_sale(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        user_id: &str,
    ) -> ServiceResult<Option<Sale>> {
        let Some(sale) = lock_sale(&mut *conn, sale_id).await? else {
            debug!(sale_id = %sale_id, "Cancel requested for unknown sale");
            return Ok(None);
        };

        if !sale.status.can_cancel() {
            debug!(sale_id = %sale_id, status = sale.status.as_str(), "Sale cannot be cancelled");
            return Ok(None);
        }

        let today = Utc::now().date_naive();
        for item in items_for_sale(&mut *conn, sale_id).await? {
            adjust_locked(
                &mut *conn,
                &item.product_code,
                StockChangeType::AddShelf,
                item.quantity,
                today,
            )
            .await?;
        }

        let cancelled = mark_cancelled(&mut *conn, sale_id, user_id, sale.version)
            .await?
            .ok_or_else(|| ServiceError::ConcurrencyConflict {
                code: sale_id.to_string(),
            })?;

        Ok(Some(cancelled))
    }

    async fn refresh_inventory(&self, sale_id: &str) {
        if let Err(e) = self.inventory.refresh_cache().await {
            warn!(sale_id = %sale_id, error = %e, "Cache refresh after sale failed");
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn get_sale(&self, sale_id: &str) -> ServiceResult<Option<Sale>> {
        Ok(self.db.sales().get_by_id(sale_id).await?)
    }

    pub async fn get_sale_by_number(&self, sale_number: &str) -> ServiceResult<Option<Sale>> {
        Ok(self.db.sales().get_by_number(sale_number).await?)
    }

    /// Lines of a sale in bill order; empty for an unknown id.
    pub async fn get_sale_items(&self, sale_id: &str) -> ServiceResult<Vec<SaleItem>> {
        Ok(self.db.sales().get_items(sale_id).await?)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn daily_sales_report(&self, date: NaiveDate) -> ServiceResult<DailySalesReport> {
        Ok(self.db.reports().daily(date).await?)
    }

    /// Aggregates over the inclusive range `from..=to`.
    pub async fn sales_statistics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<SalesStatistics> {
        Ok(self.db.reports().statistics(from, to).await?)
    }

    pub async fn top_selling_products(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> ServiceResult<Vec<ProductSales>> {
        Ok(self.db.reports().top_selling(from, to, limit).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{file_db, inventory, memory_db, product, sales, LOCK_TIMEOUT};
    use syos_core::{parse_sale_sequence, PaymentMethod, ProductState};

    async fn setup(products: &[(&str, i64, i64)]) -> (Database, Arc<InventoryService>, SalesService) {
        let db = memory_db().await;
        let inv = inventory(&db).await;
        for (code, price, shelf) in products {
            inv.add_product(product(code, *price, 10, *shelf)).await.unwrap();
        }
        let svc = sales(&db, &inv, TaxRate::zero());
        (db, inv, svc)
    }

    async fn shelf(inv: &InventoryService, code: &str) -> i64 {
        inv.get_product(code).await.unwrap().unwrap().quantity_on_shelf
    }

    async fn stored_shelf(db: &Database, code: &str) -> i64 {
        db.products()
            .get_by_code(code)
            .await
            .unwrap()
            .unwrap()
            .quantity_on_shelf
    }

    async fn item_rows(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_sale_completes_and_decrements() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 4)]).await;

        let sale = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("MILK", 2), SaleLine::new("BREAD", 1)],
                "cashier-1",
            )
            .await
            .unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert!(sale.completed_at.is_some());
        assert_eq!(parse_sale_sequence(&sale.sale_number), Some(1));
        assert_eq!(sale.subtotal_cents, 800);
        assert_eq!(sale.total_cents, 800);
        assert_eq!(sale.payment_method, PaymentMethod::Card);
        assert_eq!(sale.cash_tendered_cents, 800);
        assert_eq!(sale.change_cents, 0);

        let items = svc.get_sale_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_no, 1);
        assert_eq!(items[0].product_code, "MILK");
        assert_eq!(items[0].product_name, "MILK item");
        assert_eq!(items[0].subtotal_cents, 500);
        assert_eq!(items[1].product_code, "BREAD");

        // Cache agrees with the store
        assert_eq!(shelf(&inv, "MILK").await, 8);
        assert_eq!(stored_shelf(&db, "MILK").await, 8);
        assert_eq!(shelf(&inv, "BREAD").await, 3);

        let fetched = svc.get_sale(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched, sale);
        assert_eq!(
            svc.get_sale_by_number(&sale.sale_number).await.unwrap(),
            Some(sale.clone())
        );
    }

    #[tokio::test]
    async fn test_cash_sale_with_discount_and_tax() {
        let db = memory_db().await;
        let inv = inventory(&db).await;
        inv.add_product(product("WINE", 1000, 0, 5)).await.unwrap();
        let svc = sales(&db, &inv, TaxRate::from_bps(1000));

        let sale = svc
            .create_sale(
                SaleDraft::cash(5000).with_discount(500),
                &[SaleLine::new("WINE", 2)],
                "cashier-1",
            )
            .await
            .unwrap();

        assert_eq!(sale.subtotal_cents, 2000);
        assert_eq!(sale.discount_cents, 500);
        assert_eq!(sale.tax_cents, 150);
        assert_eq!(sale.total_cents, 1650);
        assert_eq!(sale.cash_tendered_cents, 5000);
        assert_eq!(sale.change_cents, 3350);
    }

    #[tokio::test]
    async fn test_short_cash_writes_nothing() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10)]).await;

        let err = svc
            .create_sale(SaleDraft::cash(100), &[SaleLine::new("MILK", 1)], "cashier-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(_)));
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(shelf(&inv, "MILK").await, 10);
    }

    #[tokio::test]
    async fn test_insufficient_stock_on_any_line_aborts_all() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 1)]).await;

        let err = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("MILK", 3), SaleLine::new("BREAD", 2)],
                "cashier-1",
            )
            .await
            .unwrap_err();

        match err {
            ServiceError::InsufficientStock {
                code,
                requested,
                available,
            } => {
                assert_eq!(code, "BREAD");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_rows(&db).await, 0);
        assert_eq!(stored_shelf(&db, "MILK").await, 10);
        assert_eq!(shelf(&inv, "MILK").await, 10);
    }

    #[tokio::test]
    async fn test_repeated_lines_are_checked_against_their_sum() {
        let (_db, inv, svc) = setup(&[("EGGS", 420, 5)]).await;

        let err = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("EGGS", 3), SaleLine::new("EGGS", 3)],
                "cashier-1",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));

        let sale = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("EGGS", 2), SaleLine::new("EGGS", 3)],
                "cashier-1",
            )
            .await
            .unwrap();
        assert_eq!(svc.get_sale_items(&sale.id).await.unwrap().len(), 2);
        assert_eq!(shelf(&inv, "EGGS").await, 0);
        assert_eq!(
            inv.get_product("EGGS").await.unwrap().unwrap().state,
            ProductState::Available
        );
    }

    #[tokio::test]
    async fn test_unknown_product_and_bad_input() {
        let (db, _inv, svc) = setup(&[("MILK", 250, 10)]).await;

        let err = svc
            .create_sale(SaleDraft::card(), &[SaleLine::new("GHOST", 1)], "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ProductNotFound(_)));

        let err = svc
            .create_sale(SaleDraft::card(), &[], "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = svc
            .create_sale(SaleDraft::card(), &[SaleLine::new("MILK", 1)], "")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_on_last_line_rolls_back_everything() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 10), ("JAM", 450, 10)]).await;
        sqlx::query(
            "CREATE TRIGGER fail_jam_line BEFORE INSERT ON sale_items \
             WHEN NEW.product_code = 'JAM' BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = svc
            .create_sale(
                SaleDraft::card(),
                &[
                    SaleLine::new("MILK", 1),
                    SaleLine::new("BREAD", 2),
                    SaleLine::new("JAM", 3),
                ],
                "cashier-1",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_rows(&db).await, 0);
        for code in ["MILK", "BREAD", "JAM"] {
            let stored = db.products().get_by_code(code).await.unwrap().unwrap();
            assert_eq!(stored.quantity_on_shelf, 10);
            assert_eq!(stored.version, 0);
            assert_eq!(shelf(&inv, code).await, 10);
        }
    }

    #[tokio::test]
    async fn test_suppressed_stock_write_is_concurrency_conflict() {
        let (db, _inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 10)]).await;
        sqlx::query(
            "CREATE TRIGGER freeze_bread BEFORE UPDATE OF quantity_on_shelf ON products \
             WHEN OLD.code = 'BREAD' BEGIN SELECT RAISE(IGNORE); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("MILK", 1), SaleLine::new("BREAD", 1)],
                "cashier-1",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ConcurrencyConflict { ref code } if code == "BREAD"));
        assert!(err.is_retryable());
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(stored_shelf(&db, "MILK").await, 10);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly_once() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 4)]).await;

        let sale = svc
            .create_sale(
                SaleDraft::cash(2000),
                &[SaleLine::new("MILK", 3), SaleLine::new("BREAD", 4)],
                "cashier-1",
            )
            .await
            .unwrap();
        assert_eq!(shelf(&inv, "BREAD").await, 0);

        assert!(svc.cancel_sale(&sale.id, "manager-1").await.unwrap());

        assert_eq!(shelf(&inv, "MILK").await, 10);
        assert_eq!(shelf(&inv, "BREAD").await, 4);
        assert_eq!(stored_shelf(&db, "BREAD").await, 4);

        let cancelled = svc.get_sale(&sale.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("manager-1"));
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.version, sale.version + 1);

        // Second cancel is a no-op
        assert!(!svc.cancel_sale(&sale.id, "manager-1").await.unwrap());
        assert_eq!(shelf(&inv, "MILK").await, 10);
        assert_eq!(stored_shelf(&db, "MILK").await, 10);
        assert_eq!(
            svc.get_sale(&sale.id).await.unwrap().unwrap().version,
            cancelled.version
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_sale() {
        let (_db, _inv, svc) = setup(&[]).await;
        assert!(!svc.cancel_sale("no-such-sale", "manager-1").await.unwrap());
        assert!(svc.get_sale("no-such-sale").await.unwrap().is_none());
        assert!(svc.get_sale_items("no-such-sale").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_of_deleted_product_rolls_back() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 10)]).await;
        let sale = svc
            .create_sale(
                SaleDraft::card(),
                &[SaleLine::new("MILK", 1), SaleLine::new("BREAD", 1)],
                "cashier-1",
            )
            .await
            .unwrap();
        inv.delete_product("BREAD").await.unwrap();

        let err = svc.cancel_sale(&sale.id, "manager-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::ProductNotFound(_)));

        assert_eq!(stored_shelf(&db, "MILK").await, 9);
        assert_eq!(
            svc.get_sale(&sale.id).await.unwrap().unwrap().status,
            SaleStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_oversized_price_fails_without_writing() {
        let (db, _inv, svc) = setup(&[]).await;
        // Written straight to the store, past the price ceiling add_product enforces
        db.products()
            .insert(&product("GOLD", i64::MAX / 2 + 1, 0, 5))
            .await
            .unwrap();

        let err = svc
            .create_sale(SaleDraft::card(), &[SaleLine::new("GOLD", 2)], "cashier-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::AmountOverflow { .. })));

        assert_eq!(stored_shelf(&db, "GOLD").await, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert_eq!(item_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn test_sale_numbers_continue_after_restart() {
        let (db, inv, svc) = setup(&[("MILK", 250, 10)]).await;
        let first = svc
            .create_sale(SaleDraft::card(), &[SaleLine::new("MILK", 1)], "cashier-1")
            .await
            .unwrap();

        // A fresh generator seeds from what is already persisted
        let restarted = sales(&db, &inv, TaxRate::zero());
        let second = restarted
            .create_sale(SaleDraft::card(), &[SaleLine::new("MILK", 1)], "cashier-1")
            .await
            .unwrap();

        assert_eq!(parse_sale_sequence(&first.sale_number), Some(1));
        assert_eq!(parse_sale_sequence(&second.sale_number), Some(2));
    }

    #[tokio::test]
    async fn test_reports_exclude_cancelled_revenue() {
        let (_db, _inv, svc) = setup(&[("MILK", 250, 10), ("BREAD", 300, 10)]).await;
        svc.create_sale(SaleDraft::card(), &[SaleLine::new("MILK", 2)], "cashier-1")
            .await
            .unwrap();
        let void = svc
            .create_sale(SaleDraft::card(), &[SaleLine::new("BREAD", 5)], "cashier-1")
            .await
            .unwrap();
        svc.cancel_sale(&void.id, "manager-1").await.unwrap();

        let today = Utc::now().date_naive();
        let daily = svc.daily_sales_report(today).await.unwrap();
        assert_eq!(daily.sale_count, 1);
        assert_eq!(daily.cancelled_count, 1);
        assert_eq!(daily.items_sold, 2);
        assert_eq!(daily.revenue_cents, 500);

        let stats = svc.sales_statistics(today, today).await.unwrap();
        assert_eq!(stats.largest_sale_cents, 500);

        let top = svc.top_selling_products(today, today, 5).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_code, "MILK");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        const STOCK: i64 = 20;
        const CASHIERS: i64 = 8;
        let per_sale = STOCK / CASHIERS + 1;

        let (_dir, db) = file_db(CASHIERS as u32 + 2).await;
        let inv = Arc::new(InventoryService::start(db.clone(), LOCK_TIMEOUT).await.unwrap());
        inv.add_product(product("COLA", 150, 0, STOCK)).await.unwrap();
        let svc = Arc::new(sales(&db, &inv, TaxRate::zero()));

        let mut handles = Vec::new();
        for i in 0..CASHIERS {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.create_sale(
                    SaleDraft::card(),
                    &[SaleLine::new("COLA", per_sale)],
                    &format!("cashier-{i}"),
                )
                .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(ServiceError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected {other:?}"),
            }
        }

        assert_eq!(succeeded, STOCK / per_sale);
        let remaining = stored_shelf(&db, "COLA").await;
        assert_eq!(remaining, STOCK - succeeded * per_sale);
        assert!(remaining >= 0);
        assert_eq!(shelf(&inv, "COLA").await, remaining);
        assert_eq!(db.sales().count().await.unwrap(), succeeded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_on_disjoint_products() {
        let (_dir, db) = file_db(6).await;
        let inv = Arc::new(InventoryService::start(db.clone(), LOCK_TIMEOUT).await.unwrap());
        let codes = ["P-1", "P-2", "P-3", "P-4"];
        for code in codes {
            inv.add_product(product(code, 100, 0, 3)).await.unwrap();
        }
        let svc = Arc::new(sales(&db, &inv, TaxRate::zero()));

        let mut handles = Vec::new();
        for code in codes {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.create_sale(SaleDraft::card(), &[SaleLine::new(code, 3)], "cashier-1")
                    .await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap().sale_number);
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), codes.len());

        for code in codes {
            assert_eq!(stored_shelf(&db, code).await, 0);
        }
    }
}
