//! Accounting: chart of accounts and journal entries with embedded lines.
//!
//! Journal entry payloads carry their lines; the balance invariant is
//! enforced by the repository (via keel-core) before anything is written,
//! and an unbalanced submission comes back as a 400.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name};
use keel_core::{Account, AccountType, EntryStatus, JournalEntry, Transaction};
use keel_db::{EntryLineInput, JournalEntryInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/journal-entries", get(list_entries).post(create_entry))
        .route(
            "/journal-entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct AccountPayload {
    code: String,
    name: String,
    account_type: AccountType,
    parent_id: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct EntryLinePayload {
    account_id: String,
    #[serde(default)]
    debit_cents: i64,
    #[serde(default)]
    credit_cents: i64,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JournalEntryPayload {
    /// Omitted on create: the next number in the company's JE sequence for
    /// the entry date is allocated.
    entry_number: Option<String>,
    date: NaiveDate,
    description: String,
    reference: Option<String>,
    #[serde(default)]
    status: EntryStatus,
    lines: Vec<EntryLinePayload>,
}

/// Entry plus its lines, the shape both detail and create/update return.
#[derive(Debug, Serialize)]
struct JournalEntryResponse {
    #[serde(flatten)]
    entry: JournalEntry,
    lines: Vec<Transaction>,
}

fn default_true() -> bool {
    true
}

impl JournalEntryPayload {
    fn into_input(self, entry_number: String) -> JournalEntryInput {
        JournalEntryInput {
            entry_number,
            date: self.date,
            description: self.description,
            reference: self.reference,
            status: self.status,
            lines: self
                .lines
                .into_iter()
                .map(|l| EntryLineInput {
                    account_id: l.account_id,
                    debit_cents: l.debit_cents,
                    credit_cents: l.credit_cents,
                    description: l.description,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Chart of accounts
// =============================================================================

async fn list_accounts(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(
        state.db.accounting().list_accounts(&scope.company_id).await?,
    ))
}

async fn create_account(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    validate_code("code", &payload.code)?;
    validate_name("name", &payload.name)?;

    let now = Utc::now();
    let account = Account {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        code: payload.code.trim().to_string(),
        name: payload.name.trim().to_string(),
        account_type: payload.account_type,
        parent_id: payload.parent_id,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.accounting().insert_account(&account).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    let account = state
        .db
        .accounting()
        .get_account(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {id}")))?;

    Ok(Json(account))
}

async fn update_account(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AccountPayload>,
) -> ApiResult<Json<Account>> {
    validate_code("code", &payload.code)?;
    validate_name("name", &payload.name)?;

    let mut account = state
        .db
        .accounting()
        .get_account(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {id}")))?;

    account.code = payload.code.trim().to_string();
    account.name = payload.name.trim().to_string();
    account.account_type = payload.account_type;
    account.parent_id = payload.parent_id;
    account.is_active = payload.is_active;

    state.db.accounting().update_account(&account).await?;
    Ok(Json(account))
}

async fn delete_account(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .accounting()
        .delete_account(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Journal entries
// =============================================================================

async fn list_entries(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<JournalEntry>>> {
    Ok(Json(
        state.db.accounting().list_entries(&scope.company_id).await?,
    ))
}

async fn create_entry(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<JournalEntryPayload>,
) -> ApiResult<(StatusCode, Json<JournalEntryResponse>)> {
    let entry_number = match payload.entry_number.clone() {
        Some(number) => {
            validate_code("entry_number", &number)?;
            number.trim().to_string()
        }
        None => {
            let prefix = format!("JE-{}", payload.date.format("%Y%m%d"));
            let sequence = state
                .db
                .accounting()
                .max_entry_sequence(&scope.company_id, &prefix)
                .await?
                + 1;
            keel_core::numbering::format_document_number("JE", payload.date, sequence)
        }
    };

    let entry = state
        .db
        .accounting()
        .create_entry(
            &scope.company_id,
            Some(&scope.user.id),
            payload.into_input(entry_number),
        )
        .await?;

    let lines = state.db.accounting().get_entry_lines(&entry.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(JournalEntryResponse { entry, lines }),
    ))
}

async fn get_entry(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JournalEntryResponse>> {
    let entry = state
        .db
        .accounting()
        .get_entry(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Journal entry not found: {id}")))?;

    let lines = state.db.accounting().get_entry_lines(&entry.id).await?;
    Ok(Json(JournalEntryResponse { entry, lines }))
}

async fn update_entry(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<JournalEntryPayload>,
) -> ApiResult<Json<JournalEntryResponse>> {
    // Omitted number on update keeps the existing one.
    let entry_number = match payload.entry_number.clone() {
        Some(number) => {
            validate_code("entry_number", &number)?;
            number.trim().to_string()
        }
        None => state
            .db
            .accounting()
            .get_entry(&scope.company_id, &id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Journal entry not found: {id}")))?
            .entry_number,
    };

    let entry = state
        .db
        .accounting()
        .update_entry(&scope.company_id, &id, payload.into_input(entry_number))
        .await?;

    let lines = state.db.accounting().get_entry_lines(&entry.id).await?;
    Ok(Json(JournalEntryResponse { entry, lines }))
}

async fn delete_entry(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .accounting()
        .delete_entry(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
