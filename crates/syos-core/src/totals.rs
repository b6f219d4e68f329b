//! # Sale Totals
//!
//! Computes the money side of a sale from priced lines and the till's draft.
//!
//! ```text
//! subtotal  = Σ unit_price × quantity
//! taxable   = subtotal − discount           (0 ≤ discount ≤ subtotal)
//! tax       = taxable × rate                (round half up)
//! total     = taxable + tax
//! change    = tendered − total              (cash: tendered ≥ total)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, SaleDraft, TaxRate};

/// Final amounts of a sale, all in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub cash_tendered_cents: i64,
    pub change_cents: i64,
}

impl SaleTotals {
    /// Computes totals for lines given as `(unit_price_cents, quantity)`.
    ///
    /// Card payments tender exactly the total. Cash payments must tender at
    /// least the total.
    pub fn compute<I>(lines: I, draft: &SaleDraft, tax_rate: TaxRate) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let subtotal = lines
            .into_iter()
            .try_fold(Money::zero(), |acc, (price, qty)| {
                Money::from_cents(price)
                    .multiply_quantity(qty)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| overflow("subtotal"))?;

        if draft.discount_cents < 0 || draft.discount_cents > subtotal.cents() {
            return Err(CoreError::InvalidDiscount {
                discount_cents: draft.discount_cents,
                subtotal_cents: subtotal.cents(),
            });
        }

        let taxable = subtotal - Money::from_cents(draft.discount_cents);
        let tax = taxable.calculate_tax(tax_rate);
        let total = taxable.checked_add(tax).ok_or_else(|| overflow("total"))?;

        let (tendered, change) = match draft.payment_method {
            PaymentMethod::Card => (total, Money::zero()),
            PaymentMethod::Cash => {
                let tendered = draft
                    .cash_tendered_cents
                    .map(Money::from_cents)
                    .ok_or_else(|| CoreError::InvalidPaymentAmount {
                        reason: "cash tendered is required for cash payments".to_string(),
                    })?;
                let change = tendered
                    .checked_sub(total)
                    .ok_or_else(|| overflow("change"))?;
                if change.is_negative() {
                    return Err(CoreError::InvalidPaymentAmount {
                        reason: format!("tendered {} does not cover total {}", tendered, total),
                    });
                }
                (tendered, change)
            }
        };

        Ok(Self {
            subtotal_cents: subtotal.cents(),
            discount_cents: draft.discount_cents,
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            cash_tendered_cents: tendered.cents(),
            change_cents: change.cents(),
        })
    }
}

fn overflow(field: &str) -> CoreError {
    CoreError::AmountOverflow {
        field: field.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_sale_with_change() {
        let totals = SaleTotals::compute(
            vec![(250, 2), (100, 3)],
            &SaleDraft::cash(1000),
            TaxRate::zero(),
        )
        .unwrap();

        assert_eq!(totals.subtotal_cents, 800);
        assert_eq!(totals.total_cents, 800);
        assert_eq!(totals.cash_tendered_cents, 1000);
        assert_eq!(totals.change_cents, 200);
    }

    #[test]
    fn test_discount_then_tax() {
        // (1000 - 100) at 10% = 90 tax
        let draft = SaleDraft::card().with_discount(100);
        let totals = SaleTotals::compute(vec![(1000, 1)], &draft, TaxRate::from_bps(1000)).unwrap();

        assert_eq!(totals.discount_cents, 100);
        assert_eq!(totals.tax_cents, 90);
        assert_eq!(totals.total_cents, 990);
        assert_eq!(totals.cash_tendered_cents, 990);
        assert_eq!(totals.change_cents, 0);
    }

    #[test]
    fn test_cash_short_rejected() {
        let err = SaleTotals::compute(vec![(500, 1)], &SaleDraft::cash(499), TaxRate::zero())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));
    }

    #[test]
    fn test_cash_without_tender_rejected() {
        let draft = SaleDraft {
            payment_method: PaymentMethod::Cash,
            discount_cents: 0,
            cash_tendered_cents: None,
        };
        assert!(SaleTotals::compute(vec![(500, 1)], &draft, TaxRate::zero()).is_err());
    }

    #[test]
    fn test_discount_bounds() {
        let too_big = SaleDraft::card().with_discount(501);
        assert!(matches!(
            SaleTotals::compute(vec![(500, 1)], &too_big, TaxRate::zero()),
            Err(CoreError::InvalidDiscount { .. })
        ));

        let negative = SaleDraft::card().with_discount(-1);
        assert!(SaleTotals::compute(vec![(500, 1)], &negative, TaxRate::zero()).is_err());

        let full = SaleDraft::card().with_discount(500);
        let totals = SaleTotals::compute(vec![(500, 1)], &full, TaxRate::zero()).unwrap();
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_oversized_amounts_fail_instead_of_wrapping() {
        let line = SaleTotals::compute(vec![(i64::MAX / 2 + 1, 2)], &SaleDraft::card(), TaxRate::zero());
        assert!(matches!(line, Err(CoreError::AmountOverflow { ref field }) if field == "subtotal"));

        let sum = SaleTotals::compute(
            vec![(i64::MAX - 10, 1), (20, 1)],
            &SaleDraft::card(),
            TaxRate::zero(),
        );
        assert!(matches!(sum, Err(CoreError::AmountOverflow { .. })));

        let tender = SaleTotals::compute(vec![(500, 1)], &SaleDraft::cash(i64::MIN), TaxRate::zero());
        assert!(matches!(tender, Err(CoreError::AmountOverflow { .. })));
    }
}
