//! # Sale Number Generator
//!
//! Hands out `YYYYMMDD-NNNN` numbers, unique per process and per store.
//!
//! ```text
//! next()
//!   │  timeout(mutex.lock())  ──► LockTimeout
//!   ▼
//! same UTC day as last call? ── no ──► seed = MAX(sequence) persisted today
//!   │ yes                               │
//!   ▼                                   ▼
//! last += 1  ◄──────────────────────────┘
//!   │
//!   ▼
//! format_sale_number(day, last)
//! ```
//!
//! Seeding from the highest persisted sequence (rather than a count) means
//! gaps left by rolled-back sales never lead to a reused number. Across
//! processes the UNIQUE constraint on `sales.sale_number` is the backstop.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use syos_core::format_sale_number;
use syos_db::Database;

#[derive(Debug, Clone, Copy)]
struct DailySequence {
    date: NaiveDate,
    last: i64,
}

/// Serialises sale-number allocation.
#[derive(Debug)]
pub struct SaleNumberGenerator {
    db: Database,
    state: Mutex<Option<DailySequence>>,
    lock_timeout: Duration,
}

impl SaleNumberGenerator {
    pub fn new(db: Database, lock_timeout: Duration) -> Self {
        SaleNumberGenerator {
            db,
            state: Mutex::new(None),
            lock_timeout,
        }
    }

    /// Next number for today (UTC).
    pub async fn next(&self) -> ServiceResult<String> {
        self.next_for(Utc::now().date_naive()).await
    }

    /// Next number for `date`.
    pub async fn next_for(&self, date: NaiveDate) -> ServiceResult<String> {
        let mut state = tokio::time::timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| {
                ServiceError::lock_timeout("sale number", self.lock_timeout)
            })?;

        let last = match *state {
            Some(seq) if seq.date == date => seq.last,
            _ => {
                let persisted = self.db.sales().max_sequence_for_day(date).await?;
                debug!(%date, persisted, "Seeding sale sequence");
                persisted
            }
        };

        let next = last + 1;
        *state = Some(DailySequence { date, last: next });

        Ok(format_sale_number(date, next))
    }
}
