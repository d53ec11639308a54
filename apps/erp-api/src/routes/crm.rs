//! CRM: leads, opportunities, and activities.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_name, validate_probability};
use keel_core::{
    Activity, ActivityType, Lead, LeadSource, LeadStatus, Opportunity, OpportunityStage,
    RelatedKind,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route("/leads/:id", get(get_lead).put(update_lead).delete(delete_lead))
        .route(
            "/opportunities",
            get(list_opportunities).post(create_opportunity),
        )
        .route(
            "/opportunities/:id",
            get(get_opportunity).put(update_opportunity).delete(delete_opportunity),
        )
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct LeadPayload {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    mobile: Option<String>,
    source: LeadSource,
    #[serde(default)]
    status: LeadStatus,
    assigned_to: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpportunityPayload {
    lead_id: Option<String>,
    contact_id: String,
    title: String,
    value_cents: i64,
    #[serde(default = "default_probability")]
    probability: i64,
    stage: OpportunityStage,
    expected_close_date: Option<NaiveDate>,
    assigned_to: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityPayload {
    activity_type: ActivityType,
    subject: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    completed: bool,
    related_kind: RelatedKind,
    related_id: String,
    assigned_to: Option<String>,
}

fn default_probability() -> i64 {
    50
}

// =============================================================================
// Leads
// =============================================================================

async fn list_leads(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Lead>>> {
    Ok(Json(state.db.crm().list_leads(&scope.company_id).await?))
}

async fn create_lead(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<LeadPayload>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    validate_name("name", &payload.name)?;

    let now = Utc::now();
    let lead = Lead {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        email: payload.email,
        phone: payload.phone,
        mobile: payload.mobile,
        source: payload.source,
        status: payload.status,
        assigned_to: payload.assigned_to,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.crm().insert_lead(&lead).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn get_lead(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Lead>> {
    let lead = state
        .db
        .crm()
        .get_lead(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Lead not found: {id}")))?;

    Ok(Json(lead))
}

async fn update_lead(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LeadPayload>,
) -> ApiResult<Json<Lead>> {
    validate_name("name", &payload.name)?;

    let mut lead = state
        .db
        .crm()
        .get_lead(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Lead not found: {id}")))?;

    lead.name = payload.name.trim().to_string();
    lead.email = payload.email;
    lead.phone = payload.phone;
    lead.mobile = payload.mobile;
    lead.source = payload.source;
    lead.status = payload.status;
    lead.assigned_to = payload.assigned_to;
    lead.notes = payload.notes;

    state.db.crm().update_lead(&lead).await?;
    Ok(Json(lead))
}

async fn delete_lead(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.crm().delete_lead(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Opportunities
// =============================================================================

async fn list_opportunities(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Opportunity>>> {
    Ok(Json(state.db.crm().list_opportunities(&scope.company_id).await?))
}

async fn create_opportunity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<OpportunityPayload>,
) -> ApiResult<(StatusCode, Json<Opportunity>)> {
    validate_name("title", &payload.title)?;
    validate_probability(payload.probability)?;

    let now = Utc::now();
    let opportunity = Opportunity {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        lead_id: payload.lead_id,
        contact_id: payload.contact_id,
        title: payload.title.trim().to_string(),
        value_cents: payload.value_cents,
        probability: payload.probability,
        stage: payload.stage,
        expected_close_date: payload.expected_close_date,
        assigned_to: payload.assigned_to,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.crm().insert_opportunity(&opportunity).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

async fn get_opportunity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Opportunity>> {
    let opportunity = state
        .db
        .crm()
        .get_opportunity(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Opportunity not found: {id}")))?;

    Ok(Json(opportunity))
}

async fn update_opportunity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<OpportunityPayload>,
) -> ApiResult<Json<Opportunity>> {
    validate_name("title", &payload.title)?;
    validate_probability(payload.probability)?;

    let mut opportunity = state
        .db
        .crm()
        .get_opportunity(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Opportunity not found: {id}")))?;

    opportunity.lead_id = payload.lead_id;
    opportunity.contact_id = payload.contact_id;
    opportunity.title = payload.title.trim().to_string();
    opportunity.value_cents = payload.value_cents;
    opportunity.probability = payload.probability;
    opportunity.stage = payload.stage;
    opportunity.expected_close_date = payload.expected_close_date;
    opportunity.assigned_to = payload.assigned_to;
    opportunity.notes = payload.notes;

    state.db.crm().update_opportunity(&opportunity).await?;
    Ok(Json(opportunity))
}

async fn delete_opportunity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.crm().delete_opportunity(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Activities
// =============================================================================

async fn list_activities(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Activity>>> {
    Ok(Json(state.db.crm().list_activities(&scope.company_id).await?))
}

async fn create_activity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<ActivityPayload>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    validate_name("subject", &payload.subject)?;

    let now = Utc::now();
    let activity = Activity {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        activity_type: payload.activity_type,
        subject: payload.subject.trim().to_string(),
        description: payload.description,
        due_date: payload.due_date,
        completed: payload.completed,
        related_kind: payload.related_kind,
        related_id: payload.related_id,
        assigned_to: payload.assigned_to,
        created_at: now,
        updated_at: now,
    };

    state.db.crm().insert_activity(&activity).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn get_activity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Activity>> {
    let activity = state
        .db
        .crm()
        .get_activity(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Activity not found: {id}")))?;

    Ok(Json(activity))
}

async fn update_activity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ActivityPayload>,
) -> ApiResult<Json<Activity>> {
    validate_name("subject", &payload.subject)?;

    let mut activity = state
        .db
        .crm()
        .get_activity(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Activity not found: {id}")))?;

    activity.activity_type = payload.activity_type;
    activity.subject = payload.subject.trim().to_string();
    activity.description = payload.description;
    activity.due_date = payload.due_date;
    activity.completed = payload.completed;
    activity.related_kind = payload.related_kind;
    activity.related_id = payload.related_id;
    activity.assigned_to = payload.assigned_to;

    state.db.crm().update_activity(&activity).await?;
    Ok(Json(activity))
}

async fn delete_activity(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.crm().delete_activity(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
