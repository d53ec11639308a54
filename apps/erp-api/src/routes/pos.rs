//! Point of sale: completed-sale listing, completion, and void.
//!
//! Completion is the one endpoint that writes across modules: it checks and
//! deducts inventory stock, logs movements, and records payments, all in
//! one transaction. Insufficient stock is a 400 and nothing is written.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::validate_quantity;
use keel_core::{PosPayment, PosPaymentMethod, PosSale, PosSaleItem};
use keel_db::{PosRepository, PosSaleInput, PosSaleLineInput, PosTenderInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(complete_sale))
        .route("/sales/:id", get(get_sale))
        .route("/sales/:id/void", post(void_sale))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct SaleLinePayload {
    item_id: String,
    quantity: i64,
    unit_price_cents: i64,
    #[serde(default)]
    discount_cents: i64,
}

#[derive(Debug, Deserialize)]
struct TenderPayload {
    amount_cents: i64,
    payment_method: PosPaymentMethod,
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SalePayload {
    customer_id: Option<String>,
    #[serde(default)]
    discount_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    payment_method: PosPaymentMethod,
    notes: Option<String>,
    items: Vec<SaleLinePayload>,
    #[serde(default)]
    payments: Vec<TenderPayload>,
}

/// Sale plus its items and payments, the shape detail and completion return.
#[derive(Debug, Serialize)]
struct SaleResponse {
    #[serde(flatten)]
    sale: PosSale,
    items: Vec<PosSaleItem>,
    payments: Vec<PosPayment>,
}

async fn sale_response(repo: &PosRepository, sale: PosSale) -> ApiResult<SaleResponse> {
    let items = repo.get_sale_items(&sale.id).await?;
    let payments = repo.get_sale_payments(&sale.id).await?;
    Ok(SaleResponse {
        sale,
        items,
        payments,
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_sales(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PosSale>>> {
    Ok(Json(state.db.pos().list_sales(&scope.company_id).await?))
}

async fn complete_sale(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<SalePayload>,
) -> ApiResult<(StatusCode, Json<SaleResponse>)> {
    for line in &payload.items {
        validate_quantity(line.quantity)?;
    }

    let input = PosSaleInput {
        customer_id: payload.customer_id,
        discount_cents: payload.discount_cents,
        tax_cents: payload.tax_cents,
        payment_method: payload.payment_method,
        notes: payload.notes,
        lines: payload
            .items
            .into_iter()
            .map(|l| PosSaleLineInput {
                item_id: l.item_id,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
                discount_cents: l.discount_cents,
            })
            .collect(),
        payments: payload
            .payments
            .into_iter()
            .map(|p| PosTenderInput {
                amount_cents: p.amount_cents,
                payment_method: p.payment_method,
                reference: p.reference,
            })
            .collect(),
    };

    let repo = state.db.pos();
    let sale = repo
        .complete_sale(&scope.company_id, Some(&scope.user.id), input)
        .await?;

    Ok((StatusCode::CREATED, Json(sale_response(&repo, sale).await?)))
}

async fn get_sale(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleResponse>> {
    let repo = state.db.pos();
    let sale = repo
        .get_sale(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("POS sale not found: {id}")))?;

    Ok(Json(sale_response(&repo, sale).await?))
}

async fn void_sale(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleResponse>> {
    let repo = state.db.pos();
    let sale = repo.void_sale(&scope.company_id, &id).await?;

    Ok(Json(sale_response(&repo, sale).await?))
}
