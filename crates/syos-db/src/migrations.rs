//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in filename order when a [`Database`](crate::Database) opens.
//! sqlx records each applied file in `_sqlx_migrations`, so reopening an
//! up-to-date store is a no-op.
//!
//! New schema goes in a new `NNN_description.sql`; applied files are never
//! edited, because sqlx checksums them.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    if applied >= total {
        debug!(total, "Schema up to date");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;
    info!(pending = total - applied, "Applied schema migrations");
    Ok(())
}

/// `(embedded, applied)` migration counts. Before the first run the
/// bookkeeping table does not exist and `applied` is zero.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.iter().count();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((embedded, applied.max(0) as usize))
}
