//! Authentication: register, login, token refresh, current user, and the
//! active-company switch.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::validate_name;
use keel_core::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .route("/switch-company", post(switch_company))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: String,
    password: String,
    email: Option<String>,
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct SwitchCompanyPayload {
    company_id: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

fn token_response(state: &AppState, user: User) -> ApiResult<TokenResponse> {
    Ok(TokenResponse {
        access_token: state.jwt.generate_access_token(&user.id)?,
        refresh_token: state.jwt.generate_refresh_token(&user.id)?,
        user,
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    validate_name("username", &payload.username)?;
    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: keel_db::generate_id(),
        username: payload.username.trim().to_string(),
        email: payload.email,
        full_name: payload.full_name,
        password_hash: hash_password(&payload.password)?,
        active_company_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&user).await?;

    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .db
        .users()
        .get_by_username(payload.username.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("User is deactivated".to_string()));
    }

    Ok(Json(token_response(&state, user)?))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = state.jwt.validate_refresh_token(&payload.refresh_token)?;

    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    Ok(Json(token_response(&state, user)?))
}

async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// Switches the caller's active company. Membership is required; the switch
/// is what points every subsequent data request at the new tenant.
async fn switch_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SwitchCompanyPayload>,
) -> ApiResult<Json<User>> {
    let is_member = state
        .db
        .companies()
        .is_member(&auth.user.id, &payload.company_id)
        .await?;

    if !is_member {
        return Err(ApiError::Forbidden(
            "Not a member of the requested company".to_string(),
        ));
    }

    state
        .db
        .users()
        .set_active_company(&auth.user.id, Some(&payload.company_id))
        .await?;

    let user = state
        .db
        .users()
        .get_by_id(&auth.user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("User vanished during switch".to_string()))?;

    Ok(Json(user))
}
