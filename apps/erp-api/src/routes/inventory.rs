//! Inventory: warehouses, items, stock levels, and stock movements.
//!
//! Stock rows expose `available = quantity - reserved`. Posting a movement
//! adjusts the target stock row in the same transaction as the audit record.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name, validate_non_negative_cents, validate_quantity};
use keel_core::{Item, ItemUnit, MovementType, Stock, StockMovement, Warehouse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route(
            "/warehouses/:id",
            get(get_warehouse).put(update_warehouse).delete(delete_warehouse),
        )
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/stocks", get(list_stocks).post(set_stock))
        .route("/stocks/:id", get(get_stock).put(update_stock).delete(delete_stock))
        .route("/stock-movements", get(list_movements).post(create_movement))
        .route("/stock-movements/:id", get(get_movement))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct WarehousePayload {
    name: String,
    code: String,
    location: Option<String>,
    manager_id: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    name: String,
    sku: String,
    barcode: Option<String>,
    category: Option<String>,
    #[serde(default)]
    unit: ItemUnit,
    #[serde(default)]
    min_stock: i64,
    #[serde(default)]
    max_stock: i64,
    #[serde(default)]
    cost_cents: i64,
    description: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct StockPayload {
    warehouse_id: String,
    item_id: String,
    quantity: i64,
    #[serde(default)]
    reserved: i64,
}

#[derive(Debug, Deserialize)]
struct StockLevelsPayload {
    quantity: i64,
    #[serde(default)]
    reserved: i64,
}

#[derive(Debug, Deserialize)]
struct MovementPayload {
    warehouse_id: String,
    item_id: String,
    movement_type: MovementType,
    quantity: i64,
    reference_type: Option<String>,
    reference_number: Option<String>,
    date: Option<DateTime<Utc>>,
    notes: Option<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Warehouses
// =============================================================================

async fn list_warehouses(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Warehouse>>> {
    Ok(Json(
        state.db.inventory().list_warehouses(&scope.company_id).await?,
    ))
}

async fn create_warehouse(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<WarehousePayload>,
) -> ApiResult<(StatusCode, Json<Warehouse>)> {
    validate_name("name", &payload.name)?;
    validate_code("code", &payload.code)?;

    let now = Utc::now();
    let warehouse = Warehouse {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        code: payload.code.trim().to_string(),
        location: payload.location,
        manager_id: payload.manager_id,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.inventory().insert_warehouse(&warehouse).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

async fn get_warehouse(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Warehouse>> {
    let warehouse = state
        .db
        .inventory()
        .get_warehouse(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Warehouse not found: {id}")))?;

    Ok(Json(warehouse))
}

async fn update_warehouse(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<WarehousePayload>,
) -> ApiResult<Json<Warehouse>> {
    validate_name("name", &payload.name)?;
    validate_code("code", &payload.code)?;

    let mut warehouse = state
        .db
        .inventory()
        .get_warehouse(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Warehouse not found: {id}")))?;

    warehouse.name = payload.name.trim().to_string();
    warehouse.code = payload.code.trim().to_string();
    warehouse.location = payload.location;
    warehouse.manager_id = payload.manager_id;
    warehouse.is_active = payload.is_active;

    state.db.inventory().update_warehouse(&warehouse).await?;
    Ok(Json(warehouse))
}

async fn delete_warehouse(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .inventory()
        .delete_warehouse(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Items
// =============================================================================

async fn list_items(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.db.inventory().list_items(&scope.company_id).await?))
}

async fn create_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    validate_name("name", &payload.name)?;
    validate_code("sku", &payload.sku)?;
    validate_non_negative_cents("cost", payload.cost_cents)?;

    let now = Utc::now();
    let item = Item {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        sku: payload.sku.trim().to_string(),
        barcode: payload.barcode,
        category: payload.category,
        unit: payload.unit,
        min_stock: payload.min_stock,
        max_stock: payload.max_stock,
        cost_cents: payload.cost_cents,
        description: payload.description,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };

    state.db.inventory().insert_item(&item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Item>> {
    let item = state
        .db
        .inventory()
        .get_item(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item not found: {id}")))?;

    Ok(Json(item))
}

async fn update_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ItemPayload>,
) -> ApiResult<Json<Item>> {
    validate_name("name", &payload.name)?;
    validate_code("sku", &payload.sku)?;
    validate_non_negative_cents("cost", payload.cost_cents)?;

    let mut item = state
        .db
        .inventory()
        .get_item(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item not found: {id}")))?;

    item.name = payload.name.trim().to_string();
    item.sku = payload.sku.trim().to_string();
    item.barcode = payload.barcode;
    item.category = payload.category;
    item.unit = payload.unit;
    item.min_stock = payload.min_stock;
    item.max_stock = payload.max_stock;
    item.cost_cents = payload.cost_cents;
    item.description = payload.description;
    item.is_active = payload.is_active;

    state.db.inventory().update_item(&item).await?;
    Ok(Json(item))
}

async fn delete_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.inventory().delete_item(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Stock
// =============================================================================

async fn list_stocks(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Stock>>> {
    Ok(Json(state.db.inventory().list_stocks(&scope.company_id).await?))
}

async fn get_stock(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Stock>> {
    let stock = state
        .db
        .inventory()
        .get_stock(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Stock not found: {id}")))?;

    Ok(Json(stock))
}

/// Sets a stock row directly (inventory count correction). Upserts at
/// (warehouse, item); bulk quantity changes should go through movements so
/// they leave an audit trail.
async fn set_stock(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<StockPayload>,
) -> ApiResult<(StatusCode, Json<Stock>)> {
    if payload.quantity < 0 || payload.reserved < 0 {
        return Err(ApiError::Validation(
            "quantity and reserved must not be negative".to_string(),
        ));
    }

    state
        .db
        .inventory()
        .get_warehouse(&scope.company_id, &payload.warehouse_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Warehouse not found: {}", payload.warehouse_id))
        })?;
    state
        .db
        .inventory()
        .get_item(&scope.company_id, &payload.item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item not found: {}", payload.item_id)))?;

    state
        .db
        .inventory()
        .upsert_stock(
            &payload.warehouse_id,
            &payload.item_id,
            payload.quantity,
            payload.reserved,
        )
        .await?;

    let stocks = state.db.inventory().list_stocks(&scope.company_id).await?;
    let stock = stocks
        .into_iter()
        .find(|s| s.warehouse_id == payload.warehouse_id && s.item_id == payload.item_id)
        .ok_or_else(|| ApiError::Internal("Stock row vanished after upsert".to_string()))?;

    Ok((StatusCode::CREATED, Json(stock)))
}

async fn update_stock(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StockLevelsPayload>,
) -> ApiResult<Json<Stock>> {
    if payload.quantity < 0 || payload.reserved < 0 {
        return Err(ApiError::Validation(
            "quantity and reserved must not be negative".to_string(),
        ));
    }

    let stock = state
        .db
        .inventory()
        .get_stock(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Stock not found: {id}")))?;

    state
        .db
        .inventory()
        .upsert_stock(
            &stock.warehouse_id,
            &stock.item_id,
            payload.quantity,
            payload.reserved,
        )
        .await?;

    let stock = state
        .db
        .inventory()
        .get_stock(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Stock not found: {id}")))?;
    Ok(Json(stock))
}

async fn delete_stock(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.inventory().delete_stock(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Movements
// =============================================================================

async fn list_movements(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    Ok(Json(
        state.db.inventory().list_movements(&scope.company_id).await?,
    ))
}

/// Posts a movement: the audit record and the stock adjustment land
/// together or not at all.
async fn create_movement(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<MovementPayload>,
) -> ApiResult<(StatusCode, Json<StockMovement>)> {
    // Adjustments may carry their own sign; every other movement type is a
    // positive quantity with direction in the type.
    if payload.quantity < 0 && payload.movement_type != MovementType::Adjustment {
        return Err(ApiError::Validation(
            "quantity must be positive for this movement type".to_string(),
        ));
    }
    validate_quantity(payload.quantity.abs())?;

    // Both sides of the movement must be in the caller's company.
    state
        .db
        .inventory()
        .get_warehouse(&scope.company_id, &payload.warehouse_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Warehouse not found: {}", payload.warehouse_id))
        })?;
    state
        .db
        .inventory()
        .get_item(&scope.company_id, &payload.item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item not found: {}", payload.item_id)))?;

    let now = Utc::now();
    let movement = StockMovement {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        warehouse_id: payload.warehouse_id,
        item_id: payload.item_id,
        movement_type: payload.movement_type,
        quantity: payload.quantity,
        reference_type: payload.reference_type,
        reference_number: payload.reference_number,
        date: payload.date.unwrap_or(now),
        notes: payload.notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.inventory().post_movement(&movement).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

async fn get_movement(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StockMovement>> {
    let movement = state
        .db
        .inventory()
        .get_movement(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Stock movement not found: {id}")))?;

    Ok(Json(movement))
}
