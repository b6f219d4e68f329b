//! # syos-db: Persistent Store for SYOS
//!
//! SQLite access for products, sales and sale items, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SYOS Data Flow                                   │
//! │                                                                         │
//! │  InventoryService / SalesService (syos-services)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     syos-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_initial  │   │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │              │   │   │
//! │  │   │ busy_timeout  │    │ ReportRepo    │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - `DbConfig` and the `Database` handle
//! - [`migrations`] - Schema files compiled in with `sqlx::migrate!`
//! - [`error`] - `DbError`, sorted by what callers can do about it
//! - [`repository`] - Pool-backed repositories plus the statements that run
//!   inside a caller's transaction (`lock_for_update`, `write_stock`, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use syos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("syos.db")).await?;
//! let products = db.products().list_all().await?;
//!
//! let mut tx = db.pool().begin().await?;
//! let milk = syos_db::repository::product::lock_for_update(&mut *tx, "MILK-1L").await?;
//! tx.commit().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
