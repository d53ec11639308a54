//! API error types and their HTTP mapping.
//!
//! ## Status Mapping
//! ```text
//! Validation / business rule / no active company  → 400
//! Missing or invalid credentials                  → 401
//! Membership violation                            → 403
//! Missing or cross-company record                 → 404
//! Duplicate business key                          → 409
//! Everything else                                 → 500
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use keel_core::{CoreError, ValidationError};
use keel_db::DbError;

/// API errors, carrying enough context for the JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    /// No active company selected for the requesting user.
    #[error("No active company selected")]
    NoActiveCompany,

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::NoActiveCompany => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NoActiveCompany => "no_active_company",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        (self.status(), body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } => ApiError::BadRequest(err.to_string()),
            DbError::Domain(core) => ApiError::BadRequest(core.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Item", "x").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::UniqueViolation {
            field: "items.sku".to_string(),
            value: "SKU-1".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::Domain(CoreError::UnbalancedEntry {
            debit_cents: 1,
            credit_cents: 2,
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_no_active_company_is_bad_request() {
        assert_eq!(ApiError::NoActiveCompany.status(), StatusCode::BAD_REQUEST);
    }
}
