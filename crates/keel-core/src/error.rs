//! # Error Types
//!
//! Domain-specific error types for keel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  keel-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  keel-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  erp-api errors (in app)                                               │
//! │  └── ApiError         - What HTTP clients see (status + JSON body)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. They are caught at the API
/// boundary and translated to HTTP 400 responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A journal entry whose debit total differs from its credit total.
    #[error("Journal entry is not balanced: debits {debit_cents}, credits {credit_cents}")]
    UnbalancedEntry {
        debit_cents: i64,
        credit_cents: i64,
    },

    /// A journal entry line carrying both a debit and a credit, or neither.
    #[error("Entry line for account {account_id} must carry exactly one of debit or credit")]
    AmbiguousEntryLine { account_id: String },

    /// A document submitted without any line items.
    #[error("{document} must have at least one line item")]
    EmptyDocument { document: &'static str },

    /// Requested quantity exceeds aggregate available stock across all of
    /// the company's warehouses.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Operation not allowed in the record's current status
    /// (e.g. voiding an already-voided sale).
    #[error("{entity} is {status}, cannot {operation}")]
    InvalidStatus {
        entity: &'static str,
        status: String,
        operation: &'static str,
    },

    /// Document totals that do not add up (subtotal − discount + tax ≠ total).
    #[error("Document totals do not reconcile: {reason}")]
    TotalsMismatch { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet field-level requirements and are
/// checked before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. invalid UUID, malformed slug).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value for a per-company unique key (SKU, code, number).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "SKU-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for SKU-001: available 3, requested 5"
        );

        let err = CoreError::UnbalancedEntry {
            debit_cents: 10_000,
            credit_cents: 9_500,
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced: debits 10000, credits 9500"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
