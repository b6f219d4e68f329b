//! # Repository Module
//!
//! Store access for SYOS.
//!
//! ## Two Kinds of Statements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-scoped (repository methods)       Transaction-scoped (free fns)   │
//! │  ────────────────────────────────       ──────────────────────────────  │
//! │  db.products().get_by_code(code)        product::lock_for_update(tx, ..)│
//! │  db.products().list_all()               product::write_stock(tx, ..)    │
//! │  db.products().update_versioned(p)      sale::insert_pending(tx, ..)    │
//! │  db.sales().get_by_id(id)               sale::mark_cancelled(tx, ..)    │
//! │  db.reports().daily(date)                                               │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  own connection, autocommit             caller's `&mut *tx`, committed  │
//! │                                         or rolled back by the caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product lookup and admin CRUD
//! - [`sale::SaleRepository`] - Sale and sale item lookup
//! - [`report::ReportRepository`] - Read-only sales aggregates

pub mod product;
pub mod report;
pub mod sale;
