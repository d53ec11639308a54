//! Contacts, scoped to the active company.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::validate_name;
use keel_core::{Contact, ContactType};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[derive(Debug, Deserialize)]
struct ContactPayload {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    address: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    company_name: Option<String>,
    position: Option<String>,
    website: Option<String>,
    #[serde(default)]
    contact_type: ContactType,
    notes: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ContactPayload {
    fn apply(self, contact: &mut Contact) {
        contact.name = self.name.trim().to_string();
        contact.email = self.email;
        contact.phone = self.phone;
        contact.mobile = self.mobile;
        contact.address = self.address;
        contact.city = self.city;
        contact.postal_code = self.postal_code;
        contact.country = self.country;
        contact.company_name = self.company_name;
        contact.position = self.position;
        contact.website = self.website;
        contact.contact_type = self.contact_type;
        contact.notes = self.notes;
        contact.is_active = self.is_active;
    }
}

async fn list_contacts(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(state.db.contacts().list(&scope.company_id).await?))
}

async fn create_contact(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<ContactPayload>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    validate_name("name", &payload.name)?;

    let now = Utc::now();
    let mut contact = Contact {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: String::new(),
        email: None,
        phone: None,
        mobile: None,
        address: None,
        city: None,
        postal_code: None,
        country: None,
        company_name: None,
        position: None,
        website: None,
        contact_type: ContactType::Customer,
        notes: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    payload.apply(&mut contact);

    state.db.contacts().insert(&contact).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn get_contact(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .db
        .contacts()
        .get(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contact not found: {id}")))?;

    Ok(Json(contact))
}

async fn update_contact(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ContactPayload>,
) -> ApiResult<Json<Contact>> {
    validate_name("name", &payload.name)?;

    let mut contact = state
        .db
        .contacts()
        .get(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contact not found: {id}")))?;

    payload.apply(&mut contact);
    state.db.contacts().update(&contact).await?;
    Ok(Json(contact))
}

async fn delete_contact(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.contacts().delete(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
