//! E-commerce: storefront categories, products, and orders.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name, validate_non_negative_cents, validate_quantity, validate_slug};
use keel_core::{Category, Order, OrderItem, OrderStatus, Product};
use keel_db::repository::ecommerce::OrderLineInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct CategoryPayload {
    name: String,
    slug: String,
    parent_id: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    name: String,
    slug: String,
    sku: String,
    category_id: Option<String>,
    description: Option<String>,
    price_cents: i64,
    sale_price_cents: Option<i64>,
    #[serde(default)]
    cost_cents: i64,
    #[serde(default)]
    stock_quantity: i64,
    images: Option<serde_json::Value>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_featured: bool,
}

#[derive(Debug, Deserialize)]
struct OrderLinePayload {
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
    total_cents: i64,
}

#[derive(Debug, Deserialize)]
struct OrderPayload {
    order_number: String,
    customer_id: String,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    subtotal_cents: i64,
    #[serde(default)]
    tax_cents: i64,
    #[serde(default)]
    shipping_cents: i64,
    #[serde(default)]
    total_cents: i64,
    shipping_address: Option<serde_json::Value>,
    billing_address: Option<serde_json::Value>,
    notes: Option<String>,
    #[serde(default)]
    items: Vec<OrderLinePayload>,
}

#[derive(Debug, Serialize)]
struct OrderResponse {
    #[serde(flatten)]
    order: Order,
    items: Vec<OrderItem>,
}

fn default_true() -> bool {
    true
}

fn collect_order_lines(lines: Vec<OrderLinePayload>) -> ApiResult<Vec<OrderLineInput>> {
    lines
        .into_iter()
        .map(|l| {
            validate_quantity(l.quantity)?;
            Ok(OrderLineInput {
                product_id: l.product_id,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
                total_cents: l.total_cents,
            })
        })
        .collect()
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(
        state.db.ecommerce().list_categories(&scope.company_id).await?,
    ))
}

async fn create_category(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate_name("name", &payload.name)?;
    validate_slug(&payload.slug)?;

    let now = Utc::now();
    let category = Category {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        slug: payload.slug.trim().to_string(),
        parent_id: payload.parent_id,
        description: payload.description,
        image_url: payload.image_url,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.ecommerce().insert_category(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    let category = state
        .db
        .ecommerce()
        .get_category(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category not found: {id}")))?;

    Ok(Json(category))
}

async fn update_category(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<Json<Category>> {
    validate_name("name", &payload.name)?;
    validate_slug(&payload.slug)?;

    let mut category = state
        .db
        .ecommerce()
        .get_category(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category not found: {id}")))?;

    category.name = payload.name.trim().to_string();
    category.slug = payload.slug.trim().to_string();
    category.parent_id = payload.parent_id;
    category.description = payload.description;
    category.image_url = payload.image_url;
    category.is_active = payload.is_active;

    state.db.ecommerce().update_category(&category).await?;
    Ok(Json(category))
}

async fn delete_category(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.ecommerce().delete_category(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.ecommerce().list_products(&scope.company_id).await?))
}

async fn create_product(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    validate_name("name", &payload.name)?;
    validate_slug(&payload.slug)?;
    validate_code("sku", &payload.sku)?;
    validate_non_negative_cents("price", payload.price_cents)?;

    let now = Utc::now();
    let product = Product {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        slug: payload.slug.trim().to_string(),
        sku: payload.sku.trim().to_string(),
        category_id: payload.category_id,
        description: payload.description,
        price_cents: payload.price_cents,
        sale_price_cents: payload.sale_price_cents,
        cost_cents: payload.cost_cents,
        stock_quantity: payload.stock_quantity,
        images: payload.images,
        is_active: payload.is_active,
        is_featured: payload.is_featured,
        created_at: now,
        updated_at: now,
    };

    state.db.ecommerce().insert_product(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .ecommerce()
        .get_product(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    Ok(Json(product))
}

async fn update_product(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<Json<Product>> {
    validate_name("name", &payload.name)?;
    validate_slug(&payload.slug)?;
    validate_code("sku", &payload.sku)?;
    validate_non_negative_cents("price", payload.price_cents)?;

    let mut product = state
        .db
        .ecommerce()
        .get_product(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

    product.name = payload.name.trim().to_string();
    product.slug = payload.slug.trim().to_string();
    product.sku = payload.sku.trim().to_string();
    product.category_id = payload.category_id;
    product.description = payload.description;
    product.price_cents = payload.price_cents;
    product.sale_price_cents = payload.sale_price_cents;
    product.cost_cents = payload.cost_cents;
    product.stock_quantity = payload.stock_quantity;
    product.images = payload.images;
    product.is_active = payload.is_active;
    product.is_featured = payload.is_featured;

    state.db.ecommerce().update_product(&product).await?;
    Ok(Json(product))
}

async fn delete_product(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.ecommerce().delete_product(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.ecommerce().list_orders(&scope.company_id).await?))
}

async fn create_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    validate_code("order_number", &payload.order_number)?;
    let lines = collect_order_lines(payload.items)?;

    let now = Utc::now();
    let order = Order {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        order_number: payload.order_number,
        customer_id: payload.customer_id,
        status: payload.status,
        subtotal_cents: payload.subtotal_cents,
        tax_cents: payload.tax_cents,
        shipping_cents: payload.shipping_cents,
        total_cents: payload.total_cents,
        shipping_address: payload.shipping_address,
        billing_address: payload.billing_address,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.ecommerce().create_order(&order, &lines).await?;
    let items = state.db.ecommerce().get_order_items(&order.id).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse { order, items })))
}

async fn get_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .db
        .ecommerce()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {id}")))?;

    let items = state.db.ecommerce().get_order_items(&order.id).await?;
    Ok(Json(OrderResponse { order, items }))
}

async fn update_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<Json<OrderResponse>> {
    validate_code("order_number", &payload.order_number)?;
    let lines = collect_order_lines(payload.items)?;

    let mut order = state
        .db
        .ecommerce()
        .get_order(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {id}")))?;

    order.order_number = payload.order_number;
    order.customer_id = payload.customer_id;
    order.status = payload.status;
    order.subtotal_cents = payload.subtotal_cents;
    order.tax_cents = payload.tax_cents;
    order.shipping_cents = payload.shipping_cents;
    order.total_cents = payload.total_cents;
    order.shipping_address = payload.shipping_address;
    order.billing_address = payload.billing_address;
    order.notes = payload.notes;

    state.db.ecommerce().update_order(&order, &lines).await?;
    let items = state.db.ecommerce().get_order_items(&order.id).await?;
    Ok(Json(OrderResponse { order, items }))
}

async fn delete_order(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.ecommerce().delete_order(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
