//! Procurement: suppliers, purchase orders, and goods receipts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name, validate_quantity};
use keel_core::{
    PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, PurchaseReceipt, PurchaseReceiptItem,
    Supplier,
};
use keel_db::repository::procurement::{PurchaseLineInput, ReceiptLineInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/purchase-orders", get(list_orders).post(create_order))
        .route(
            "/purchase-orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route(
            "/receipts/:id",
            get(get_receipt).put(update_receipt).delete(delete_receipt),
        )
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct SupplierPayload {
    name: String,
    contact_person: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    tax_id: Option<String>,
    payment_terms: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct PurchaseLinePayload {
    item_id: String,
    quantity: i64,
    unit_price_cents: i64,
    total_cents: i64,
}

#[derive(Debug, Deserialize)]
struct PurchaseOrderPayload {
    po_number: String,
    supplier_id: String,
    date: NaiveDate,
    expected_delivery_date: Option<NaiveDate>,
    status: PurchaseOrderStatus,
    #[serde(default)]
    subtotal_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    #[serde(default)]
    shipping_cents: i64,
    #[serde(default)]
    total_cents: i64,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<PurchaseLinePayload>,
}

#[derive(Debug, Deserialize)]
struct ReceiptLinePayload {
    po_item_id: String,
    quantity_received: i64,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReceiptPayload {
    receipt_number: String,
    purchase_order_id: String,
    date: NaiveDate,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<ReceiptLinePayload>,
}

#[derive(Debug, Serialize)]
struct PurchaseOrderResponse {
    #[serde(flatten)]
    order: PurchaseOrder,
    items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Serialize)]
struct ReceiptResponse {
    #[serde(flatten)]
    receipt: PurchaseReceipt,
    items: Vec<PurchaseReceiptItem>,
}

fn default_true() -> bool {
    true
}

fn collect_po_lines(lines: Vec<PurchaseLinePayload>) -> ApiResult<Vec<PurchaseLineInput>> {
    lines
        .into_iter()
        .map(|l| {
            validate_quantity(l.quantity)?;
            Ok(PurchaseLineInput {
                item_id: l.item_id,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
                total_cents: l.total_cents,
            })
        })
        .collect()
}

// =============================================================================
// Suppliers
// =============================================================================

async fn list_suppliers(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(
        state.db.procurement().list_suppliers(&scope.company_id).await?,
    ))
}

async fn create_supplier(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<SupplierPayload>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    validate_name("name", &payload.name)?;

    let now = Utc::now();
    let supplier = Supplier {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        contact_person: payload.contact_person,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        tax_id: payload.tax_id,
        payment_terms: payload.payment_terms,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.procurement().insert_supplier(&supplier).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn get_supplier(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    let supplier = state
        .db
        .procurement()
        .get_supplier(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Supplier not found: {id}")))?;

    Ok(Json(supplier))
}

async fn update_supplier(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SupplierPayload>,
) -> ApiResult<Json<Supplier>> {
    validate_name("name", &payload.name)?;

    let mut supplier = state
        .db
        .procurement()
        .get_supplier(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Supplier not found: {id}")))?;

    supplier.name = payload.name.trim().to_string();
    supplier.contact_person = payload.contact_person;
    supplier.email = payload.email;
    supplier.phone = payload.phone;
    supplier.address = payload.address;
    supplier.tax_id = payload.tax_id;
    supplier.payment_terms = payload.payment_terms;
    supplier.is_active = payload.is_active;

    state.db.procurement().update_supplier(&supplier).await?;
    Ok(Json(supplier))
}

async fn delete_supplier(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .procurement()
        .delete_supplier(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Purchase orders
// =============================================================================

async fn list_orders(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PurchaseOrder>>> {
    Ok(Json(
        state.db.procurement().list_orders(&scope.company_id).await?,
    ))
}

async fn create_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<PurchaseOrderPayload>,
) -> ApiResult<(StatusCode, Json<PurchaseOrderResponse>)> {
    validate_code("po_number", &payload.po_number)?;
    let lines = collect_po_lines(payload.items)?;

    let now = Utc::now();
    let order = PurchaseOrder {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        po_number: payload.po_number,
        supplier_id: payload.supplier_id,
        date: payload.date,
        expected_delivery_date: payload.expected_delivery_date,
        status: payload.status,
        subtotal_cents: payload.subtotal_cents,
        tax_cents: payload.tax_cents,
        shipping_cents: payload.shipping_cents,
        total_cents: payload.total_cents,
        notes: payload.notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.procurement().create_order(&order, &lines).await?;
    let items = state.db.procurement().get_order_items(&order.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PurchaseOrderResponse { order, items }),
    ))
}

async fn get_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PurchaseOrderResponse>> {
    let order = state
        .db
        .procurement()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase order not found: {id}")))?;

    let items = state.db.procurement().get_order_items(&order.id).await?;
    Ok(Json(PurchaseOrderResponse { order, items }))
}

async fn update_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PurchaseOrderPayload>,
) -> ApiResult<Json<PurchaseOrderResponse>> {
    validate_code("po_number", &payload.po_number)?;
    let lines = collect_po_lines(payload.items)?;

    let mut order = state
        .db
        .procurement()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase order not found: {id}")))?;

    order.po_number = payload.po_number;
    order.supplier_id = payload.supplier_id;
    order.date = payload.date;
    order.expected_delivery_date = payload.expected_delivery_date;
    order.status = payload.status;
    order.subtotal_cents = payload.subtotal_cents;
    order.tax_cents = payload.tax_cents;
    order.shipping_cents = payload.shipping_cents;
    order.total_cents = payload.total_cents;
    order.notes = payload.notes;

    state.db.procurement().update_order(&order, &lines).await?;
    let items = state.db.procurement().get_order_items(&order.id).await?;
    Ok(Json(PurchaseOrderResponse { order, items }))
}

async fn delete_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .procurement()
        .delete_order(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Receipts
// =============================================================================

async fn list_receipts(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PurchaseReceipt>>> {
    Ok(Json(
        state.db.procurement().list_receipts(&scope.company_id).await?,
    ))
}

async fn create_receipt(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<ReceiptPayload>,
) -> ApiResult<(StatusCode, Json<ReceiptResponse>)> {
    validate_code("receipt_number", &payload.receipt_number)?;

    // The receipt must be against one of the company's purchase orders.
    state
        .db
        .procurement()
        .get_order(&scope.company_id, &payload.purchase_order_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Purchase order not found: {}",
                payload.purchase_order_id
            ))
        })?;

    let lines: Vec<ReceiptLineInput> = payload
        .items
        .into_iter()
        .map(|l| {
            validate_quantity(l.quantity_received)?;
            Ok(ReceiptLineInput {
                po_item_id: l.po_item_id,
                quantity_received: l.quantity_received,
                notes: l.notes,
            })
        })
        .collect::<ApiResult<_>>()?;

    let now = Utc::now();
    let receipt = PurchaseReceipt {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        receipt_number: payload.receipt_number,
        purchase_order_id: payload.purchase_order_id,
        date: payload.date,
        received_by: Some(scope.user.id.clone()),
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.procurement().create_receipt(&receipt, &lines).await?;
    let items = state.db.procurement().get_receipt_items(&receipt.id).await?;
    Ok((StatusCode::CREATED, Json(ReceiptResponse { receipt, items })))
}

async fn get_receipt(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReceiptResponse>> {
    let receipt = state
        .db
        .procurement()
        .get_receipt(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase receipt not found: {id}")))?;

    let items = state.db.procurement().get_receipt_items(&receipt.id).await?;
    Ok(Json(ReceiptResponse { receipt, items }))
}

async fn update_receipt(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ReceiptPayload>,
) -> ApiResult<Json<ReceiptResponse>> {
    validate_code("receipt_number", &payload.receipt_number)?;

    let mut receipt = state
        .db
        .procurement()
        .get_receipt(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Purchase receipt not found: {id}")))?;

    state
        .db
        .procurement()
        .get_order(&scope.company_id, &payload.purchase_order_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Purchase order not found: {}",
                payload.purchase_order_id
            ))
        })?;

    let lines: Vec<ReceiptLineInput> = payload
        .items
        .into_iter()
        .map(|l| {
            validate_quantity(l.quantity_received)?;
            Ok(ReceiptLineInput {
                po_item_id: l.po_item_id,
                quantity_received: l.quantity_received,
                notes: l.notes,
            })
        })
        .collect::<ApiResult<_>>()?;

    receipt.receipt_number = payload.receipt_number;
    receipt.purchase_order_id = payload.purchase_order_id;
    receipt.date = payload.date;
    receipt.notes = payload.notes;

    state.db.procurement().update_receipt(&receipt, &lines).await?;
    let items = state.db.procurement().get_receipt_items(&receipt.id).await?;
    Ok(Json(ReceiptResponse { receipt, items }))
}

async fn delete_receipt(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .procurement()
        .delete_receipt(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
