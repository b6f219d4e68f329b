//! # Validation Module
//!
//! Input validation for products, stock adjustments and sale lines.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (before any lock or transaction)                  │
//! │  ├── Codes, names, categories                                           │
//! │  └── Quantities, prices, line counts                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stock arithmetic (under row lock)                             │
//! │  └── InsufficientStock                                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── CHECK (quantity_on_shelf >= 0) ...                                 │
//! │  └── UNIQUE (sale_number), PRIMARY KEY (code)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use syos_core::validation::{validate_product_code, validate_quantity};
//!
//! assert!(validate_product_code("MILK-1L").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Product, SaleLine};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SALE_LINES, MAX_STOCK_FIGURE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a category (1-100 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_text("category", category, 100)
}

/// Validates the identifier of the cashier or acting user.
pub fn validate_user_id(field: &str, id: &str) -> ValidationResult<()> {
    validate_text(field, id, 100)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for a sale line or stock adjustment.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock figure (stored quantities, reorder level):
/// 0 to [`MAX_STOCK_FIGURE`].
pub fn validate_stock_figure(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_FIGURE).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_FIGURE,
        });
    }

    Ok(())
}

/// Validates a price in cents: 0 to [`MAX_PRICE_CENTS`].
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0-10000).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates every field of a product submitted for add or update.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_code(&product.code)?;
    validate_product_name(&product.name)?;
    validate_category(&product.category)?;
    validate_price_cents(product.unit_price_cents)?;
    validate_stock_figure("quantity_in_store", product.quantity_in_store)?;
    validate_stock_figure("quantity_on_shelf", product.quantity_on_shelf)?;
    validate_stock_figure("reorder_level", product.reorder_level)?;

    if let Some(expiry) = product.expiry_date {
        if expiry < product.purchase_date {
            return Err(ValidationError::InvalidFormat {
                field: "expiry_date".to_string(),
                reason: "must not be before purchase_date".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates the lines of a sale.
///
/// ## Rules
/// - 1 to [`MAX_SALE_LINES`] lines
/// - Every line has a valid code and quantity
pub fn validate_sale_lines(lines: &[SaleLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "sale lines".to_string(),
        });
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "sale lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in lines {
        validate_product_code(&line.product_code)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
