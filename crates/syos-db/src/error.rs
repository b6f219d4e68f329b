//! # Store Errors
//!
//! `DbError` is what every repository and transaction helper returns.
//! SQLite failures are sorted into the few cases callers branch on:
//!
//! ```text
//! sqlx::Error
//!   ├─ Database(e) ── e.kind() ──► UniqueViolation / ForeignKeyViolation / CheckViolation
//!   │                 message  ──► Locked ("database is locked", SQLITE_BUSY)
//!   │                 otherwise ─► QueryFailed (trigger RAISE(ABORT), syntax, ...)
//!   ├─ PoolTimedOut ─────────────► PoolExhausted
//!   ├─ PoolClosed ───────────────► ConnectionFailed
//!   └─ anything else ────────────► Internal
//! ```
//!
//! `Locked` and `PoolExhausted` are transient: the same call may succeed once
//! the competing transaction commits.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A product code or sale number collided with an existing row.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A table CHECK rejected the row, e.g. a quantity below zero.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// A competing writer kept the database lock past `busy_timeout`.
    ///
    /// ```text
    /// tx A: lock MILK ───────────────────────── commit
    /// tx B:      lock MILK ── waits ── busy_timeout ──► Locked
    /// ```
    #[error("Database is locked: {0}")]
    Locked(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// The statement itself failed; trigger aborts land here too.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Locked(_) | DbError::PoolExhausted)
    }

    fn from_database(err: &dyn DatabaseError) -> Self {
        let message = err.message().to_string();

        match err.kind() {
            ErrorKind::UniqueViolation => DbError::UniqueViolation {
                field: violated_column(&message),
                value: "unknown".to_string(),
            },
            ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
            ErrorKind::CheckViolation => DbError::CheckViolation { message },
            _ if is_lock_contention(err.code().as_deref(), &message) => DbError::Locked(message),
            _ => DbError::QueryFailed(message),
        }
    }
}

/// `UNIQUE constraint failed: products.code` yields `products.code`.
fn violated_column(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_lock_contention(code: Option<&str>, message: &str) -> bool {
    let primary = code
        .and_then(|c| c.parse::<i32>().ok())
        .map(|c| c & 0xff);

    matches!(primary, Some(5) | Some(6)) || message.contains("is locked")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_database(db_err.as_ref()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violated_column() {
        assert_eq!(
            violated_column("UNIQUE constraint failed: sales.sale_number"),
            "sales.sale_number"
        );
        assert_eq!(violated_column("garbled"), "unknown");
    }

    #[test]
    fn test_lock_contention_codes() {
        assert!(is_lock_contention(Some("5"), ""));
        assert!(is_lock_contention(Some("517"), ""));
        assert!(is_lock_contention(Some("6"), ""));
        assert!(is_lock_contention(None, "database table is locked"));
        assert!(!is_lock_contention(Some("19"), "constraint failed"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(DbError::Locked("busy".into()).is_transient());
        assert!(DbError::PoolExhausted.is_transient());
        assert!(!DbError::QueryFailed("boom".into()).is_transient());
        assert!(!DbError::not_found("Sale", "42").is_transient());
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }
}
