//! # Service Error Types
//!
//! The error taxonomy callers of the inventory and sale coordinators see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Service Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌──────────────────────┐  ┌───────────────────┐  │
//! │  │   Contention    │  │     Business         │  │   Store / Config  │  │
//! │  │                 │  │                      │  │                   │  │
//! │  │  LockTimeout    │  │  DuplicateProduct    │  │  Store(DbError)   │  │
//! │  │  Optimistic...  │  │  InsufficientStock   │  │  InvalidConfig    │  │
//! │  │  Concurrency... │  │  ProductNotFound     │  │  ConfigLoadFailed │  │
//! │  │                 │  │  Validation / Domain │  │  ConfigSaveFailed │  │
//! │  └─────────────────┘  └──────────────────────┘  └───────────────────┘  │
//! │                                                                         │
//! │  Contention errors leave nothing behind: every lock and transaction     │
//! │  is released before they reach the caller, so a retry starts clean.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use thiserror::Error;

use syos_core::{CoreError, ValidationError};
use syos_db::DbError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised by the inventory and sale coordinators.
#[derive(Debug, Error)]
pub enum ServiceError {
    // =========================================================================
    // Contention Errors
    // =========================================================================
    /// A bounded lock or mutex wait expired.
    #[error("Timed out after {timeout_ms} ms waiting for {resource}")]
    LockTimeout { resource: String, timeout_ms: u64 },

    /// The submitted version does not match the authoritative one.
    ///
    /// Not retried by the service; the caller re-fetches and resubmits.
    #[error("Product {code} was modified concurrently: submitted version {submitted}, current version {current}")]
    OptimisticLockConflict {
        code: String,
        submitted: i64,
        current: i64,
    },

    /// A row-locked write failed its version check. `code` names the
    /// product, or the sale id when a cancellation lost its sale row.
    #[error("Concurrent modification of {code} inside a locked transaction")]
    ConcurrencyConflict { code: String },

    // =========================================================================
    // Business Errors
    // =========================================================================
    /// A product with this code already exists.
    #[error("Product already exists: {0}")]
    DuplicateProduct(String),

    /// A decrement would drive a quantity negative.
    #[error("Insufficient stock for {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: i64,
        available: i64,
    },

    /// No product with this code.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Input rejected before any lock was taken.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Any other domain rule (payment, discount, sale status).
    #[error(transparent)]
    Domain(CoreError),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Underlying persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                code,
                requested,
                available,
            } => ServiceError::InsufficientStock {
                code,
                requested,
                available,
            },
            CoreError::ProductNotFound(code) => ServiceError::ProductNotFound(code),
            CoreError::Validation(v) => ServiceError::Validation(v),
            other => ServiceError::Domain(other),
        }
    }
}

/// Transactions are begun and committed through sqlx directly.
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Store(DbError::from(err))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ServiceError {
    fn from(err: toml::ser::Error) -> Self {
        ServiceError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ServiceError {
    /// Builds a `LockTimeout` for the named resource. Waits too long for
    /// `u64` milliseconds report `u64::MAX`.
    pub fn lock_timeout(resource: impl Into<String>, waited: Duration) -> Self {
        ServiceError::LockTimeout {
            resource: resource.into(),
            timeout_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns true if the same call may succeed when repeated.
    ///
    /// ## Retryable
    /// - Lock timeouts (cache lock, sale-number mutex)
    /// - Optimistic conflicts, after the caller re-fetches
    /// - Concurrency conflicts
    /// - Store lock-wait timeouts and pool exhaustion
    ///
    /// ## Not Retryable
    /// - Insufficient stock, duplicates, validation, configuration
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::LockTimeout { .. }
            | ServiceError::OptimisticLockConflict { .. }
            | ServiceError::ConcurrencyConflict { .. } => true,
            ServiceError::Store(db) => db.is_transient(),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidConfig(_)
                | ServiceError::ConfigLoadFailed(_)
                | ServiceError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_insufficient_stock_maps_to_own_variant() {
        let err: ServiceError = CoreError::InsufficientStock {
            code: "MILK".into(),
            requested: 5,
            available: 2,
        }
        .into();

        match err {
            ServiceError::InsufficientStock {
                code,
                requested,
                available,
            } => {
                assert_eq!(code, "MILK");
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_core_validation_and_domain_mapping() {
        let err: ServiceError = CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        })
        .into();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err: ServiceError = CoreError::InvalidPaymentAmount {
            reason: "short".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::Domain(_)));
        assert_eq!(err.to_string(), "Invalid payment amount: short");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ServiceError::lock_timeout("product cache", Duration::from_millis(2000)).is_retryable());
        assert!(ServiceError::ConcurrencyConflict { code: "A".into() }.is_retryable());
        assert!(ServiceError::OptimisticLockConflict {
            code: "A".into(),
            submitted: 3,
            current: 4,
        }
        .is_retryable());
        assert!(ServiceError::Store(DbError::Locked("database is locked".into())).is_retryable());

        assert!(!ServiceError::DuplicateProduct("A".into()).is_retryable());
        assert!(!ServiceError::InsufficientStock {
            code: "A".into(),
            requested: 1,
            available: 0,
        }
        .is_retryable());
        assert!(!ServiceError::Store(DbError::QueryFailed("syntax".into())).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(ServiceError::InvalidConfig("x".into()).is_config_error());
        assert!(!ServiceError::ProductNotFound("x".into()).is_config_error());
    }

    #[test]
    fn test_lock_timeout_message() {
        let err = ServiceError::lock_timeout("sale number", Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timed out after 250 ms waiting for sale number");
    }

    #[test]
    fn test_lock_timeout_saturates_huge_waits() {
        let err = ServiceError::lock_timeout("product cache", Duration::MAX);
        assert!(matches!(
            err,
            ServiceError::LockTimeout {
                timeout_ms: u64::MAX,
                ..
            }
        ));
    }
}
