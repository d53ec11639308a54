//! Sales pipeline: quotations, sales orders, invoices, and payments.
//!
//! The three line-item documents share one payload shape; lines travel with
//! their parent and are replaced wholesale on update. Recording a payment
//! settles into the invoice balance.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_positive_cents, validate_quantity};
use keel_core::{
    Invoice, InvoiceItem, InvoiceStatus, Payment, PaymentMethod, Quotation, QuotationItem,
    QuotationStatus, SalesOrder, SalesOrderItem, SalesOrderStatus,
};
use keel_db::repository::sales::SalesLineInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quotations", get(list_quotations).post(create_quotation))
        .route(
            "/quotations/:id",
            get(get_quotation).put(update_quotation).delete(delete_quotation),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/:id", get(get_payment).delete(delete_payment))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct LinePayload {
    item_id: String,
    description: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    #[serde(default)]
    discount_cents: i64,
    total_cents: i64,
}

impl LinePayload {
    fn validate(&self) -> ApiResult<()> {
        validate_quantity(self.quantity)?;
        Ok(())
    }

    fn into_input(self) -> SalesLineInput {
        SalesLineInput {
            item_id: self.item_id,
            description: self.description,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
        }
    }
}

fn collect_lines(lines: Vec<LinePayload>) -> ApiResult<Vec<SalesLineInput>> {
    lines
        .into_iter()
        .map(|l| {
            l.validate()?;
            Ok(l.into_input())
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct QuotationPayload {
    quote_number: String,
    customer_id: String,
    date: NaiveDate,
    valid_until: NaiveDate,
    status: QuotationStatus,
    #[serde(default)]
    subtotal_cents: i64,
    #[serde(default)]
    discount_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    #[serde(default)]
    total_cents: i64,
    terms: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<LinePayload>,
}

#[derive(Debug, Deserialize)]
struct OrderPayload {
    order_number: String,
    quotation_id: Option<String>,
    customer_id: String,
    date: NaiveDate,
    delivery_date: Option<NaiveDate>,
    status: SalesOrderStatus,
    #[serde(default)]
    subtotal_cents: i64,
    #[serde(default)]
    discount_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    #[serde(default)]
    total_cents: i64,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<LinePayload>,
}

#[derive(Debug, Deserialize)]
struct InvoicePayload {
    invoice_number: String,
    sales_order_id: Option<String>,
    customer_id: String,
    date: NaiveDate,
    due_date: NaiveDate,
    status: InvoiceStatus,
    #[serde(default)]
    subtotal_cents: i64,
    #[serde(default)]
    discount_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    #[serde(default)]
    total_cents: i64,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<LinePayload>,
}

#[derive(Debug, Deserialize)]
struct PaymentPayload {
    invoice_id: String,
    payment_number: String,
    date: NaiveDate,
    amount_cents: i64,
    payment_method: PaymentMethod,
    reference: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuotationResponse {
    #[serde(flatten)]
    quotation: Quotation,
    items: Vec<QuotationItem>,
}

#[derive(Debug, Serialize)]
struct OrderResponse {
    #[serde(flatten)]
    order: SalesOrder,
    items: Vec<SalesOrderItem>,
}

#[derive(Debug, Serialize)]
struct InvoiceResponse {
    #[serde(flatten)]
    invoice: Invoice,
    items: Vec<InvoiceItem>,
}

// =============================================================================
// Quotations
// =============================================================================

async fn list_quotations(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Quotation>>> {
    Ok(Json(state.db.sales().list_quotations(&scope.company_id).await?))
}

async fn create_quotation(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<QuotationPayload>,
) -> ApiResult<(StatusCode, Json<QuotationResponse>)> {
    validate_code("quote_number", &payload.quote_number)?;
    let lines = collect_lines(payload.items)?;

    let now = Utc::now();
    let quotation = Quotation {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        quote_number: payload.quote_number,
        customer_id: payload.customer_id,
        date: payload.date,
        valid_until: payload.valid_until,
        status: payload.status,
        subtotal_cents: payload.subtotal_cents,
        discount_cents: payload.discount_cents,
        tax_cents: payload.tax_cents,
        total_cents: payload.total_cents,
        terms: payload.terms,
        notes: payload.notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.sales().create_quotation(&quotation, &lines).await?;
    let items = state.db.sales().get_quotation_items(&quotation.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(QuotationResponse { quotation, items }),
    ))
}

async fn get_quotation(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuotationResponse>> {
    let quotation = state
        .db
        .sales()
        .get_quotation(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quotation not found: {id}")))?;

    let items = state.db.sales().get_quotation_items(&quotation.id).await?;
    Ok(Json(QuotationResponse { quotation, items }))
}

async fn update_quotation(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<QuotationPayload>,
) -> ApiResult<Json<QuotationResponse>> {
    validate_code("quote_number", &payload.quote_number)?;
    let lines = collect_lines(payload.items)?;

    let mut quotation = state
        .db
        .sales()
        .get_quotation(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quotation not found: {id}")))?;

    quotation.quote_number = payload.quote_number;
    quotation.customer_id = payload.customer_id;
    quotation.date = payload.date;
    quotation.valid_until = payload.valid_until;
    quotation.status = payload.status;
    quotation.subtotal_cents = payload.subtotal_cents;
    quotation.discount_cents = payload.discount_cents;
    quotation.tax_cents = payload.tax_cents;
    quotation.total_cents = payload.total_cents;
    quotation.terms = payload.terms;
    quotation.notes = payload.notes;

    state.db.sales().update_quotation(&quotation, &lines).await?;
    let items = state.db.sales().get_quotation_items(&quotation.id).await?;
    Ok(Json(QuotationResponse { quotation, items }))
}

async fn delete_quotation(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sales().delete_quotation(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sales orders
// =============================================================================

async fn list_orders(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SalesOrder>>> {
    Ok(Json(state.db.sales().list_orders(&scope.company_id).await?))
}

async fn create_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    validate_code("order_number", &payload.order_number)?;
    let lines = collect_lines(payload.items)?;

    let now = Utc::now();
    let order = SalesOrder {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        order_number: payload.order_number,
        quotation_id: payload.quotation_id,
        customer_id: payload.customer_id,
        date: payload.date,
        delivery_date: payload.delivery_date,
        status: payload.status,
        subtotal_cents: payload.subtotal_cents,
        discount_cents: payload.discount_cents,
        tax_cents: payload.tax_cents,
        total_cents: payload.total_cents,
        notes: payload.notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.sales().create_order(&order, &lines).await?;
    let items = state.db.sales().get_order_items(&order.id).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse { order, items })))
}

async fn get_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .db
        .sales()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sales order not found: {id}")))?;

    let items = state.db.sales().get_order_items(&order.id).await?;
    Ok(Json(OrderResponse { order, items }))
}

async fn update_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<Json<OrderResponse>> {
    validate_code("order_number", &payload.order_number)?;
    let lines = collect_lines(payload.items)?;

    let mut order = state
        .db
        .sales()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Sales order not found: {id}")))?;

    order.order_number = payload.order_number;
    order.quotation_id = payload.quotation_id;
    order.customer_id = payload.customer_id;
    order.date = payload.date;
    order.delivery_date = payload.delivery_date;
    order.status = payload.status;
    order.subtotal_cents = payload.subtotal_cents;
    order.discount_cents = payload.discount_cents;
    order.tax_cents = payload.tax_cents;
    order.total_cents = payload.total_cents;
    order.notes = payload.notes;

    state.db.sales().update_order(&order, &lines).await?;
    let items = state.db.sales().get_order_items(&order.id).await?;
    Ok(Json(OrderResponse { order, items }))
}

async fn delete_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sales().delete_order(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Invoices
// =============================================================================

async fn list_invoices(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(state.db.sales().list_invoices(&scope.company_id).await?))
}

async fn create_invoice(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<InvoicePayload>,
) -> ApiResult<(StatusCode, Json<InvoiceResponse>)> {
    validate_code("invoice_number", &payload.invoice_number)?;
    let lines = collect_lines(payload.items)?;

    let now = Utc::now();
    let invoice = Invoice {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        invoice_number: payload.invoice_number,
        sales_order_id: payload.sales_order_id,
        customer_id: payload.customer_id,
        date: payload.date,
        due_date: payload.due_date,
        status: payload.status,
        subtotal_cents: payload.subtotal_cents,
        discount_cents: payload.discount_cents,
        tax_cents: payload.tax_cents,
        total_cents: payload.total_cents,
        paid_amount_cents: 0,
        balance_cents: payload.total_cents,
        notes: payload.notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.sales().create_invoice(&invoice, &lines).await?;
    let items = state.db.sales().get_invoice_items(&invoice.id).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse { invoice, items })))
}

async fn get_invoice(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceResponse>> {
    let invoice = state
        .db
        .sales()
        .get_invoice(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice not found: {id}")))?;

    let items = state.db.sales().get_invoice_items(&invoice.id).await?;
    Ok(Json(InvoiceResponse { invoice, items }))
}

async fn update_invoice(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<InvoicePayload>,
) -> ApiResult<Json<InvoiceResponse>> {
    validate_code("invoice_number", &payload.invoice_number)?;
    let lines = collect_lines(payload.items)?;

    let mut invoice = state
        .db
        .sales()
        .get_invoice(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice not found: {id}")))?;

    invoice.invoice_number = payload.invoice_number;
    invoice.sales_order_id = payload.sales_order_id;
    invoice.customer_id = payload.customer_id;
    invoice.date = payload.date;
    invoice.due_date = payload.due_date;
    invoice.status = payload.status;
    invoice.subtotal_cents = payload.subtotal_cents;
    invoice.discount_cents = payload.discount_cents;
    invoice.tax_cents = payload.tax_cents;
    invoice.total_cents = payload.total_cents;
    invoice.notes = payload.notes;

    state.db.sales().update_invoice(&invoice, &lines).await?;

    // Re-read for the recomputed balance.
    let invoice = state
        .db
        .sales()
        .get_invoice(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice not found: {id}")))?;
    let items = state.db.sales().get_invoice_items(&invoice.id).await?;
    Ok(Json(InvoiceResponse { invoice, items }))
}

async fn delete_invoice(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sales().delete_invoice(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Payments
// =============================================================================

async fn list_payments(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(state.db.sales().list_payments(&scope.company_id).await?))
}

async fn create_payment(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<PaymentPayload>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    validate_code("payment_number", &payload.payment_number)?;
    validate_positive_cents("amount", payload.amount_cents)?;

    let now = Utc::now();
    let payment = Payment {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        invoice_id: payload.invoice_id,
        payment_number: payload.payment_number,
        date: payload.date,
        amount_cents: payload.amount_cents,
        payment_method: payload.payment_method,
        reference: payload.reference,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.sales().record_payment(&payment).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_payment(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    let payment = state
        .db
        .sales()
        .get_payment(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Payment not found: {id}")))?;

    Ok(Json(payment))
}

async fn delete_payment(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.sales().delete_payment(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
