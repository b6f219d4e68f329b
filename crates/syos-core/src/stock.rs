//! # Stock Arithmetic
//!
//! The single place where store-room and shelf quantities change.
//!
//! ```text
//! ┌──────────────────┬─────────────────────┬─────────────────────┐
//! │ change           │ in_store            │ on_shelf            │
//! ├──────────────────┼─────────────────────┼─────────────────────┤
//! │ ADD_STORE        │ + qty               │                     │
//! │ REMOVE_STORE     │ - qty (≥ 0)         │                     │
//! │ ADD_SHELF        │                     │ + qty               │
//! │ REMOVE_SHELF     │                     │ - qty (≥ 0)         │
//! │ MOVE_TO_SHELF    │ - qty (≥ 0)         │ + qty               │
//! │ SALE             │                     │ - qty (≥ 0)         │
//! └──────────────────┴─────────────────────┴─────────────────────┘
//! ```
//!
//! Any change that would leave a quantity negative fails with
//! [`CoreError::InsufficientStock`] and leaves the input untouched. Additions
//! stop at [`MAX_STOCK_FIGURE`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::StockChangeType;
use crate::MAX_STOCK_FIGURE;

/// Store-room and shelf quantities of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub in_store: i64,
    pub on_shelf: i64,
}

impl StockLevels {
    pub const fn new(in_store: i64, on_shelf: i64) -> Self {
        Self { in_store, on_shelf }
    }

    /// Returns the levels after applying `change` of `quantity` units.
    ///
    /// `code` only labels the error.
    pub fn apply(self, code: &str, change: StockChangeType, quantity: i64) -> CoreResult<Self> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let (in_store, on_shelf) = match change {
            StockChangeType::AddStore => (self.in_store.checked_add(quantity), Some(self.on_shelf)),
            StockChangeType::RemoveStore => {
                (self.in_store.checked_sub(quantity), Some(self.on_shelf))
            }
            StockChangeType::AddShelf => (Some(self.in_store), self.on_shelf.checked_add(quantity)),
            StockChangeType::RemoveShelf | StockChangeType::Sale => {
                (Some(self.in_store), self.on_shelf.checked_sub(quantity))
            }
            StockChangeType::MoveToShelf => (
                self.in_store.checked_sub(quantity),
                self.on_shelf.checked_add(quantity),
            ),
        };
        let in_store = within_ceiling("quantity_in_store", in_store)?;
        let on_shelf = within_ceiling("quantity_on_shelf", on_shelf)?;

        if in_store < 0 {
            return Err(CoreError::InsufficientStock {
                code: code.to_string(),
                requested: quantity,
                available: self.in_store,
            });
        }
        if on_shelf < 0 {
            return Err(CoreError::InsufficientStock {
                code: code.to_string(),
                requested: quantity,
                available: self.on_shelf,
            });
        }

        Ok(Self { in_store, on_shelf })
    }
}

/// Rejects a level above [`MAX_STOCK_FIGURE`] or past `i64`.
fn within_ceiling(field: &str, level: Option<i64>) -> CoreResult<i64> {
    match level {
        Some(level) if level <= MAX_STOCK_FIGURE => Ok(level),
        _ => Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_FIGURE,
        }
        .into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
