//! JWT authentication and the request extractors that enforce it.
//!
//! Access/refresh token pairs signed with a shared secret; passwords hashed
//! with Argon2. The [`CompanyScope`] extractor is what makes every data
//! endpoint company-scoped: it refuses requests from users with no active
//! company before a handler runs.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;
use keel_core::User;

// =============================================================================
// Claims
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

// =============================================================================
// JWT Manager
// =============================================================================

/// Issues and validates access/refresh token pairs.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.generate(user_id, "access", self.access_lifetime_secs)
    }

    /// Generate a refresh token for a user.
    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, ApiError> {
        self.generate(user_id, "refresh", self.refresh_lifetime_secs)
    }

    fn generate(&self, user_id: &str, token_type: &str, lifetime: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "access" {
            return Err(ApiError::Unauthorized("Expected access token".to_string()));
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "refresh" {
            return Err(ApiError::Unauthorized("Expected refresh token".to_string()));
        }

        Ok(claims)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with Argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Verifies a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Corrupt password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// Extractors
// =============================================================================

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// An authenticated user, resolved from the bearer token.
pub struct AuthUser {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Expected bearer token".to_string()))?;

        let claims = state.jwt.validate_access_token(token)?;

        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Forbidden("User is deactivated".to_string()));
        }

        Ok(AuthUser { user })
    }
}

/// An authenticated user together with their active company.
///
/// Every data endpoint takes this; a user with no active company selected
/// gets a 400 before the handler runs.
pub struct CompanyScope {
    pub user: User,
    pub company_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CompanyScope {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user } = AuthUser::from_request_parts(parts, state).await?;

        let company_id = user
            .active_company_id
            .clone()
            .ok_or(ApiError::NoActiveCompany)?;

        Ok(CompanyScope { user, company_id })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret".to_string(), 3600, 86400)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = manager();

        let access = manager.generate_access_token("user-001").unwrap();
        let claims = manager.validate_access_token(&access).unwrap();

        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let manager = manager();

        let access = manager.generate_access_token("user-001").unwrap();
        assert!(manager.validate_refresh_token(&access).is_err());

        let refresh = manager.generate_refresh_token("user-001").unwrap();
        assert!(manager.validate_access_token(&refresh).is_err());
        assert!(manager.validate_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let manager = manager();
        let other = JwtManager::new("other-secret".to_string(), 3600, 86400);

        let token = other.generate_access_token("user-001").unwrap();
        assert!(manager.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}
