//! Companies and memberships. A user may create exactly one company of
//! their own; switching between companies they belong to happens through
//! the auth module.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::validate_name;
use keel_core::{Company, CompanyMembership};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/memberships", get(list_memberships))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
}

#[derive(Debug, Deserialize)]
struct CompanyPayload {
    name: String,
    address: Option<String>,
    phone: Option<String>,
    tax_id: Option<String>,
    registration_number: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

async fn list_companies(auth: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.db.companies().list_owned(&auth.user.id).await?))
}

async fn create_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CompanyPayload>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    validate_name("name", &payload.name)?;

    // One owner-created company per user.
    if state.db.companies().count_owned(&auth.user.id).await? > 0 {
        return Err(ApiError::Validation(
            "You can only create one company.".to_string(),
        ));
    }

    let now = Utc::now();
    let company = Company {
        id: keel_db::generate_id(),
        owner_id: auth.user.id.clone(),
        name: payload.name.trim().to_string(),
        address: payload.address,
        phone: payload.phone,
        tax_id: payload.tax_id,
        registration_number: payload.registration_number,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.companies().insert(&company).await?;

    // The first company becomes the active one straight away.
    if auth.user.active_company_id.is_none() {
        state
            .db
            .users()
            .set_active_company(&auth.user.id, Some(&company.id))
            .await?;
    }

    Ok((StatusCode::CREATED, Json(company)))
}

async fn get_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Company>> {
    let company = state
        .db
        .companies()
        .get_owned(&auth.user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company not found: {id}")))?;

    Ok(Json(company))
}

async fn update_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CompanyPayload>,
) -> ApiResult<Json<Company>> {
    validate_name("name", &payload.name)?;

    let mut company = state
        .db
        .companies()
        .get_owned(&auth.user.id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Company not found: {id}")))?;

    company.name = payload.name.trim().to_string();
    company.address = payload.address;
    company.phone = payload.phone;
    company.tax_id = payload.tax_id;
    company.registration_number = payload.registration_number;
    company.is_active = payload.is_active;

    state.db.companies().update(&company).await?;
    Ok(Json(company))
}

async fn delete_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.companies().delete(&auth.user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_memberships(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CompanyMembership>>> {
    Ok(Json(
        state.db.companies().list_memberships(&auth.user.id).await?,
    ))
}
