//! # Document Totals
//!
//! Shared totals arithmetic for line-item documents (POS sales, orders,
//! invoices, quotations).
//!
//! ```text
//! line total     = quantity × unit price − line discount
//! subtotal       = Σ line totals
//! grand total    = subtotal − document discount + tax
//! ```
//!
//! All inputs are validated (positive quantities, non-negative money, no
//! line discounted below zero) before anything is summed, so a document
//! that computes is a document that reconciles.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{validate_non_negative_cents, validate_quantity};
use crate::MAX_DOCUMENT_LINES;

/// The money-bearing parts of one document line.
#[derive(Debug, Clone, Copy)]
pub struct LineAmounts {
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

/// Per-line total: quantity × unit price − discount.
pub fn line_total(line: &LineAmounts) -> CoreResult<Money> {
    validate_quantity(line.quantity)?;
    validate_non_negative_cents("unit_price", line.unit_price_cents)?;
    validate_non_negative_cents("discount", line.discount_cents)?;

    let gross = Money::from_cents(line.unit_price_cents).multiply_quantity(line.quantity);
    let net = gross - Money::from_cents(line.discount_cents);

    if net.is_negative() {
        return Err(CoreError::TotalsMismatch {
            reason: format!(
                "line discount {} exceeds line amount {}",
                Money::from_cents(line.discount_cents),
                gross
            ),
        });
    }

    Ok(net)
}

/// Document-level totals over a set of lines plus a document discount and tax.
///
/// Returns `(line_totals, subtotal, total)`; the caller persists the line
/// totals alongside each line and the document totals on the parent row.
pub fn compute_totals(
    lines: &[LineAmounts],
    discount_cents: i64,
    tax_cents: i64,
) -> CoreResult<(Vec<i64>, i64, i64)> {
    if lines.is_empty() {
        return Err(CoreError::EmptyDocument { document: "sale" });
    }

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(CoreError::TotalsMismatch {
            reason: format!("document exceeds {MAX_DOCUMENT_LINES} lines"),
        });
    }

    validate_non_negative_cents("discount", discount_cents)?;
    validate_non_negative_cents("tax", tax_cents)?;

    let mut line_totals = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();

    for line in lines {
        let total = line_total(line)?;
        line_totals.push(total.cents());
        subtotal += total;
    }

    let total = subtotal - Money::from_cents(discount_cents) + Money::from_cents(tax_cents);
    if total.is_negative() {
        return Err(CoreError::TotalsMismatch {
            reason: format!(
                "document discount {} exceeds subtotal {}",
                Money::from_cents(discount_cents),
                subtotal
            ),
        });
    }

    Ok((line_totals, subtotal.cents(), total.cents()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price_cents: i64, discount_cents: i64) -> LineAmounts {
        LineAmounts {
            quantity,
            unit_price_cents,
            discount_cents,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(&line(3, 299, 0)).unwrap().cents(), 897);
        assert_eq!(line_total(&line(2, 1000, 500)).unwrap().cents(), 1500);
    }

    #[test]
    fn test_line_discount_cannot_exceed_amount() {
        assert!(matches!(
            line_total(&line(1, 100, 200)).unwrap_err(),
            CoreError::TotalsMismatch { .. }
        ));
    }

    #[test]
    fn test_invalid_line_inputs() {
        assert!(line_total(&line(0, 100, 0)).is_err());
        assert!(line_total(&line(1, -100, 0)).is_err());
        assert!(line_total(&line(1, 100, -5)).is_err());
    }

    #[test]
    fn test_document_totals() {
        let lines = vec![line(3, 299, 0), line(2, 1000, 500)];
        let (line_totals, subtotal, total) = compute_totals(&lines, 200, 350).unwrap();

        assert_eq!(line_totals, vec![897, 1500]);
        assert_eq!(subtotal, 2397);
        // 2397 − 200 + 350
        assert_eq!(total, 2547);
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(
            compute_totals(&[], 0, 0).unwrap_err(),
            CoreError::EmptyDocument { .. }
        ));
    }

    #[test]
    fn test_document_discount_cannot_exceed_subtotal() {
        let lines = vec![line(1, 100, 0)];
        assert!(matches!(
            compute_totals(&lines, 500, 0).unwrap_err(),
            CoreError::TotalsMismatch { .. }
        ));
    }
}
