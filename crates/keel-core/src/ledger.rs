//! # Ledger Module
//!
//! Double-entry balance validation for journal entries.
//!
//! ## The Double-Entry Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every journal entry must balance:                                      │
//! │                                                                         │
//! │    Entry #JE-20260807-0003  "Office rent, August"                       │
//! │    ┌──────────────────────────┬─────────┬─────────┐                    │
//! │    │ Account                  │  Debit  │  Credit │                    │
//! │    ├──────────────────────────┼─────────┼─────────┤                    │
//! │    │ 6200 Rent expense        │ 1200.00 │         │                    │
//! │    │ 1000 Cash                │         │ 1200.00 │                    │
//! │    └──────────────────────────┴─────────┴─────────┘                    │
//! │                                  ═══════   ═══════                     │
//! │                                  1200.00 = 1200.00  ✓ balanced         │
//! │                                                                         │
//! │  A line carries a debit OR a credit, never both, never neither.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs before any row is written; an update that replaces an
//! entry's lines re-validates the full replacement set.

use crate::error::{CoreError, CoreResult};
use crate::MAX_DOCUMENT_LINES;

/// One line of a journal entry, as submitted for validation.
///
/// This is the validation-facing view; the persisted record
/// ([`crate::types::Transaction`]) additionally carries ids and timestamps.
#[derive(Debug, Clone)]
pub struct EntryLine {
    /// Ledger account the line posts to.
    pub account_id: String,
    /// Debit amount in cents (zero when the line is a credit).
    pub debit_cents: i64,
    /// Credit amount in cents (zero when the line is a debit).
    pub credit_cents: i64,
}

impl EntryLine {
    pub fn debit(account_id: impl Into<String>, cents: i64) -> Self {
        EntryLine {
            account_id: account_id.into(),
            debit_cents: cents,
            credit_cents: 0,
        }
    }

    pub fn credit(account_id: impl Into<String>, cents: i64) -> Self {
        EntryLine {
            account_id: account_id.into(),
            debit_cents: 0,
            credit_cents: cents,
        }
    }
}

/// Validates the double-entry invariant over a full set of entry lines.
///
/// ## Rules
/// - at least one line, at most [`MAX_DOCUMENT_LINES`]
/// - every line carries a positive debit XOR a positive credit
/// - sum(debit) == sum(credit)
///
/// ## Errors
/// - [`CoreError::EmptyDocument`] - no lines
/// - [`CoreError::AmbiguousEntryLine`] - a line with both or neither side
/// - [`CoreError::UnbalancedEntry`] - totals differ
pub fn validate_balanced(lines: &[EntryLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "journal entry",
        });
    }

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(CoreError::TotalsMismatch {
            reason: format!("entry exceeds {MAX_DOCUMENT_LINES} lines"),
        });
    }

    let mut debit_total: i64 = 0;
    let mut credit_total: i64 = 0;

    for line in lines {
        let has_debit = line.debit_cents != 0;
        let has_credit = line.credit_cents != 0;

        // Negative sides are never legal; reversal entries swap sides instead.
        if line.debit_cents < 0 || line.credit_cents < 0 || has_debit == has_credit {
            return Err(CoreError::AmbiguousEntryLine {
                account_id: line.account_id.clone(),
            });
        }

        debit_total += line.debit_cents;
        credit_total += line.credit_cents;
    }

    if debit_total != credit_total {
        return Err(CoreError::UnbalancedEntry {
            debit_cents: debit_total,
            credit_cents: credit_total,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_entry_accepted() {
        let lines = vec![
            EntryLine::debit("acc-rent", 120_000),
            EntryLine::credit("acc-cash", 120_000),
        ];
        assert!(validate_balanced(&lines).is_ok());
    }

    #[test]
    fn test_multi_line_balanced_entry_accepted() {
        // One debit split across two credits.
        let lines = vec![
            EntryLine::debit("acc-inventory", 50_000),
            EntryLine::credit("acc-cash", 30_000),
            EntryLine::credit("acc-payable", 20_000),
        ];
        assert!(validate_balanced(&lines).is_ok());
    }

    #[test]
    fn test_unbalanced_entry_rejected() {
        let lines = vec![
            EntryLine::debit("acc-rent", 120_000),
            EntryLine::credit("acc-cash", 115_000),
        ];
        let err = validate_balanced(&lines).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnbalancedEntry {
                debit_cents: 120_000,
                credit_cents: 115_000
            }
        ));
    }

    #[test]
    fn test_empty_entry_rejected() {
        let err = validate_balanced(&[]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyDocument { .. }));
    }

    #[test]
    fn test_line_with_both_sides_rejected() {
        let lines = vec![EntryLine {
            account_id: "acc-1".to_string(),
            debit_cents: 100,
            credit_cents: 100,
        }];
        assert!(matches!(
            validate_balanced(&lines).unwrap_err(),
            CoreError::AmbiguousEntryLine { .. }
        ));
    }

    #[test]
    fn test_line_with_neither_side_rejected() {
        let lines = vec![EntryLine {
            account_id: "acc-1".to_string(),
            debit_cents: 0,
            credit_cents: 0,
        }];
        assert!(matches!(
            validate_balanced(&lines).unwrap_err(),
            CoreError::AmbiguousEntryLine { .. }
        ));
    }

    #[test]
    fn test_negative_side_rejected() {
        let lines = vec![
            EntryLine::debit("acc-1", -100),
            EntryLine::credit("acc-2", -100),
        ];
        assert!(matches!(
            validate_balanced(&lines).unwrap_err(),
            CoreError::AmbiguousEntryLine { .. }
        ));
    }
}
