//! # Validation Module
//!
//! Field-level input validation shared by every API payload.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: axum extraction (type validation / deserialization)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field rules, then business rules in            │
//! │           ledger/stock before any write                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite - NOT NULL, UNIQUE, FOREIGN KEY constraints           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a business code (SKU, account code, warehouse code).
///
/// ## Rules
/// - must not be empty
/// - at most 100 characters
/// - alphanumeric, hyphens, underscores, and dots only
pub fn validate_code(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 100,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores, and dots"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (company, contact, item, route, ...).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 255 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates a URL slug (website pages, blog posts, ecommerce categories).
///
/// ## Rules
/// - must not be empty, at most 255 characters
/// - lowercase alphanumeric and hyphens only
pub fn validate_slug(value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if value.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: 255,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, digits, and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a document line quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount that may be zero but never negative
/// (prices, discounts, taxes, fees).
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a payment or opportunity amount (strictly positive).
pub fn validate_positive_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an opportunity win probability (0-100 percent).
pub fn validate_probability(value: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "probability".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (foreign keys arriving in payloads).
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("sku", "SKU-001").is_ok());
        assert!(validate_code("code", "1000.10").is_ok());
        assert!(validate_code("sku", "widget_a").is_ok());

        assert!(validate_code("sku", "").is_err());
        assert!(validate_code("sku", "   ").is_err());
        assert!(validate_code("sku", "has space").is_err());
        assert!(validate_code("sku", &"A".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Acme Trading Co.").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("about-us").is_ok());
        assert!(validate_slug("summer-sale-2026").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("About Us").is_err());
        assert!(validate_slug("no_underscores").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_cents() {
        assert!(validate_non_negative_cents("price", 0).is_ok());
        assert!(validate_non_negative_cents("price", 1099).is_ok());
        assert!(validate_non_negative_cents("price", -1).is_err());

        assert!(validate_positive_cents("amount", 100).is_ok());
        assert!(validate_positive_cents("amount", 0).is_err());
    }

    #[test]
    fn test_validate_probability() {
        assert!(validate_probability(0).is_ok());
        assert!(validate_probability(50).is_ok());
        assert!(validate_probability(100).is_ok());
        assert!(validate_probability(101).is_err());
        assert!(validate_probability(-5).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
