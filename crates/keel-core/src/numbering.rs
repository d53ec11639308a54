//! # Document Numbering
//!
//! Date-prefixed document numbers for sales, journal entries, orders, and
//! the other numbered documents.
//!
//! ## Format
//! ```text
//! POS-20260807-0004
//! ─┬─ ────┬─── ─┬──
//!  │      │     └── per-company, per-prefix sequence (4 digits, grows past
//!  │      │         9999 without truncation)
//!  │      └──────── document date (YYYYMMDD)
//!  └─────────────── document prefix (POS, JE, SO, INV, ...)
//! ```
//!
//! The sequence value is read from the database by the repositories
//! (max existing + 1) inside the same transaction that inserts the document;
//! the per-company unique index on the number column turns a lost race into
//! a transaction abort, which keeps allocation idempotent under retry.

use chrono::NaiveDate;

/// Formats a document number from its parts.
pub fn format_document_number(prefix: &str, date: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y%m%d"), sequence)
}

/// Extracts the sequence component from a document number previously
/// produced by [`format_document_number`]. Returns `None` for foreign or
/// hand-assigned numbers, which simply don't advance the sequence.
pub fn parse_sequence(number: &str) -> Option<i64> {
    number.rsplit('-').next()?.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_format() {
        assert_eq!(format_document_number("POS", date(), 4), "POS-20260807-0004");
        assert_eq!(format_document_number("JE", date(), 123), "JE-20260807-0123");
    }

    #[test]
    fn test_sequence_grows_past_four_digits() {
        assert_eq!(
            format_document_number("SO", date(), 10_001),
            "SO-20260807-10001"
        );
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("POS-20260807-0004"), Some(4));
        assert_eq!(parse_sequence("SO-20260807-10001"), Some(10_001));
        assert_eq!(parse_sequence("legacy/17"), None);
    }

    #[test]
    fn test_roundtrip() {
        let n = format_document_number("INV", date(), 42);
        assert_eq!(parse_sequence(&n), Some(42));
    }
}
