//! # Domain Errors
//!
//! Two layers, both raised before any lock is taken or any row is touched:
//!
//! ```text
//! ValidationError   malformed input (empty code, quantity ≤ 0, bad date order)
//!       │ #[from]
//!       ▼
//! CoreError         a business rule said no (not enough stock, short cash)
//!       │
//!       ▼
//! ServiceError      (syos-services) what CLI and web callers branch on
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A stock change would take a quantity below zero.
    ///
    /// `available` is the quantity in the location the change draws from:
    /// the shelf for a sale, the store room for a restock.
    #[error("Insufficient stock for {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: i64,
        available: i64,
    },

    /// Cash missing on a cash sale, or less than the total.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    #[error("Invalid discount: {discount_cents} against subtotal {subtotal_cents}")]
    InvalidDiscount {
        discount_cents: i64,
        subtotal_cents: i64,
    },

    /// A computed money amount does not fit in `i64` cents.
    #[error("{field} is too large to represent")]
    AmountOverflow { field: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected input, named by field.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// The offending field, for highlighting it in a form.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
