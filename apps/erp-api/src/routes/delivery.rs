//! Delivery logistics: drivers, deliveries, routes, and the dispatch
//! workflow (assign driver, status updates, route execution).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CompanyScope;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_code, validate_name, validate_quantity};
use keel_core::{
    Delivery, DeliveryItem, DeliveryRoute, DeliveryStatus, Driver, DriverStatus, RouteDelivery,
    RouteStatus,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drivers", get(list_drivers).post(create_driver))
        .route("/drivers/available", get(list_available_drivers))
        .route(
            "/drivers/:id",
            get(get_driver).put(update_driver).delete(delete_driver),
        )
        .route("/deliveries", get(list_deliveries).post(create_delivery))
        .route("/deliveries/pending", get(list_pending))
        .route("/deliveries/in-transit", get(list_in_transit))
        .route(
            "/deliveries/:id",
            get(get_delivery).put(update_delivery).delete(delete_delivery),
        )
        .route("/deliveries/:id/assign-driver", post(assign_driver))
        .route("/deliveries/:id/update-status", post(update_status))
        .route("/deliveries/:id/items", get(list_delivery_items).post(add_delivery_item))
        .route("/delivery-items/:id", axum::routing::delete(delete_delivery_item))
        .route("/routes", get(list_routes).post(create_route))
        .route(
            "/routes/:id",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route("/routes/:id/add-delivery", post(add_delivery_to_route))
        .route("/routes/:id/start", post(start_route))
        .route("/routes/:id/complete", post(complete_route))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct DriverPayload {
    name: String,
    phone: String,
    email: Option<String>,
    vehicle_type: Option<String>,
    vehicle_plate: Option<String>,
    license_number: Option<String>,
    #[serde(default)]
    status: DriverStatus,
    #[serde(default = "default_true")]
    is_active: bool,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeliveryPayload {
    delivery_number: String,
    sales_order_id: Option<String>,
    customer_id: String,
    driver_id: Option<String>,
    pickup_address: String,
    delivery_address: String,
    customer_phone: Option<String>,
    scheduled_date: NaiveDate,
    scheduled_time: Option<NaiveTime>,
    #[serde(default = "default_delivery_status")]
    status: DeliveryStatus,
    #[serde(default = "default_priority")]
    priority: i64,
    distance_km: Option<i64>,
    #[serde(default)]
    delivery_fee_cents: i64,
    tracking_code: Option<String>,
    notes: Option<String>,
    internal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssignDriverPayload {
    driver_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusPayload {
    status: DeliveryStatus,
}

#[derive(Debug, Deserialize)]
struct DeliveryItemPayload {
    item_id: String,
    quantity: i64,
    description: Option<String>,
    condition_on_delivery: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoutePayload {
    route_name: String,
    driver_id: Option<String>,
    date: NaiveDate,
    #[serde(default = "default_route_status")]
    status: RouteStatus,
    start_location: Option<String>,
    end_location: Option<String>,
    #[serde(default)]
    total_distance_km: i64,
    #[serde(default)]
    estimated_duration: i64,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddDeliveryPayload {
    delivery_id: String,
    sequence: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RouteResponse {
    #[serde(flatten)]
    route: DeliveryRoute,
    deliveries: Vec<RouteDelivery>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> i64 {
    1
}

fn default_delivery_status() -> DeliveryStatus {
    DeliveryStatus::Pending
}

fn default_route_status() -> RouteStatus {
    RouteStatus::Planned
}

// =============================================================================
// Drivers
// =============================================================================

async fn list_drivers(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Driver>>> {
    Ok(Json(state.db.delivery().list_drivers(&scope.company_id).await?))
}

async fn list_available_drivers(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Driver>>> {
    Ok(Json(
        state
            .db
            .delivery()
            .list_available_drivers(&scope.company_id)
            .await?,
    ))
}

async fn create_driver(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<DriverPayload>,
) -> ApiResult<(StatusCode, Json<Driver>)> {
    validate_name("name", &payload.name)?;
    validate_name("phone", &payload.phone)?;

    let now = Utc::now();
    let driver = Driver {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        name: payload.name.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        email: payload.email,
        vehicle_type: payload.vehicle_type,
        vehicle_plate: payload.vehicle_plate,
        license_number: payload.license_number,
        status: payload.status,
        is_active: payload.is_active,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.delivery().insert_driver(&driver).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn get_driver(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Driver>> {
    let driver = state
        .db
        .delivery()
        .get_driver(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Driver not found: {id}")))?;

    Ok(Json(driver))
}

async fn update_driver(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DriverPayload>,
) -> ApiResult<Json<Driver>> {
    validate_name("name", &payload.name)?;
    validate_name("phone", &payload.phone)?;

    let mut driver = state
        .db
        .delivery()
        .get_driver(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Driver not found: {id}")))?;

    driver.name = payload.name.trim().to_string();
    driver.phone = payload.phone.trim().to_string();
    driver.email = payload.email;
    driver.vehicle_type = payload.vehicle_type;
    driver.vehicle_plate = payload.vehicle_plate;
    driver.license_number = payload.license_number;
    driver.status = payload.status;
    driver.is_active = payload.is_active;
    driver.notes = payload.notes;

    state.db.delivery().update_driver(&driver).await?;
    Ok(Json(driver))
}

async fn delete_driver(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.delivery().delete_driver(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Deliveries
// =============================================================================

async fn list_deliveries(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Delivery>>> {
    Ok(Json(state.db.delivery().list_deliveries(&scope.company_id).await?))
}

async fn list_pending(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Delivery>>> {
    Ok(Json(state.db.delivery().list_pending(&scope.company_id).await?))
}

async fn list_in_transit(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Delivery>>> {
    Ok(Json(state.db.delivery().list_in_transit(&scope.company_id).await?))
}

async fn create_delivery(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<DeliveryPayload>,
) -> ApiResult<(StatusCode, Json<Delivery>)> {
    validate_code("delivery_number", &payload.delivery_number)?;
    validate_name("pickup_address", &payload.pickup_address)?;
    validate_name("delivery_address", &payload.delivery_address)?;

    let now = Utc::now();
    let delivery = Delivery {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        delivery_number: payload.delivery_number,
        sales_order_id: payload.sales_order_id,
        customer_id: payload.customer_id,
        driver_id: payload.driver_id,
        pickup_address: payload.pickup_address,
        delivery_address: payload.delivery_address,
        customer_phone: payload.customer_phone,
        scheduled_date: payload.scheduled_date,
        scheduled_time: payload.scheduled_time,
        pickup_date: None,
        delivery_date: None,
        status: payload.status,
        priority: payload.priority,
        distance_km: payload.distance_km,
        delivery_fee_cents: payload.delivery_fee_cents,
        tracking_code: payload.tracking_code,
        signature: None,
        notes: payload.notes,
        internal_notes: payload.internal_notes,
        created_by: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.delivery().insert_delivery(&delivery).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

async fn get_delivery(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Delivery>> {
    let delivery = state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;

    Ok(Json(delivery))
}

async fn update_delivery(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DeliveryPayload>,
) -> ApiResult<Json<Delivery>> {
    validate_code("delivery_number", &payload.delivery_number)?;

    let mut delivery = state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;

    delivery.delivery_number = payload.delivery_number;
    delivery.sales_order_id = payload.sales_order_id;
    delivery.customer_id = payload.customer_id;
    delivery.driver_id = payload.driver_id;
    delivery.pickup_address = payload.pickup_address;
    delivery.delivery_address = payload.delivery_address;
    delivery.customer_phone = payload.customer_phone;
    delivery.scheduled_date = payload.scheduled_date;
    delivery.scheduled_time = payload.scheduled_time;
    delivery.status = payload.status;
    delivery.priority = payload.priority;
    delivery.distance_km = payload.distance_km;
    delivery.delivery_fee_cents = payload.delivery_fee_cents;
    delivery.tracking_code = payload.tracking_code;
    delivery.notes = payload.notes;
    delivery.internal_notes = payload.internal_notes;

    state.db.delivery().update_delivery(&delivery).await?;
    Ok(Json(delivery))
}

async fn delete_delivery(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.delivery().delete_delivery(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_driver(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AssignDriverPayload>,
) -> ApiResult<Json<Delivery>> {
    state
        .db
        .delivery()
        .assign_driver(&scope.company_id, &id, &payload.driver_id)
        .await?;

    let delivery = state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;
    Ok(Json(delivery))
}

async fn update_status(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusPayload>,
) -> ApiResult<Json<Delivery>> {
    state
        .db
        .delivery()
        .update_delivery_status(&scope.company_id, &id, payload.status)
        .await?;

    let delivery = state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;
    Ok(Json(delivery))
}

// =============================================================================
// Delivery items
// =============================================================================

async fn list_delivery_items(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<DeliveryItem>>> {
    // 404 for a delivery outside the caller's company.
    state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;

    Ok(Json(state.db.delivery().get_delivery_items(&id).await?))
}

async fn add_delivery_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DeliveryItemPayload>,
) -> ApiResult<(StatusCode, Json<DeliveryItem>)> {
    validate_quantity(payload.quantity)?;

    state
        .db
        .delivery()
        .get_delivery(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery not found: {id}")))?;

    let now = Utc::now();
    let item = DeliveryItem {
        id: keel_db::generate_id(),
        delivery_id: id,
        item_id: payload.item_id,
        quantity: payload.quantity,
        description: payload.description,
        condition_on_delivery: payload.condition_on_delivery,
        created_at: now,
        updated_at: now,
    };

    state.db.delivery().insert_delivery_item(&item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_delivery_item(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .delivery()
        .delete_delivery_item(&scope.company_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Routes
// =============================================================================

async fn list_routes(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DeliveryRoute>>> {
    Ok(Json(state.db.delivery().list_routes(&scope.company_id).await?))
}

async fn create_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<RoutePayload>,
) -> ApiResult<(StatusCode, Json<DeliveryRoute>)> {
    validate_name("route_name", &payload.route_name)?;

    let now = Utc::now();
    let route = DeliveryRoute {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        route_name: payload.route_name.trim().to_string(),
        driver_id: payload.driver_id,
        date: payload.date,
        status: payload.status,
        start_location: payload.start_location,
        end_location: payload.end_location,
        total_distance_km: payload.total_distance_km,
        estimated_duration: payload.estimated_duration,
        start_time: None,
        end_time: None,
        notes: payload.notes,
        created_at: now,
        updated_at: now,
    };

    state.db.delivery().insert_route(&route).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

async fn get_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RouteResponse>> {
    let route = state
        .db
        .delivery()
        .get_route(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Route not found: {id}")))?;

    let deliveries = state.db.delivery().get_route_deliveries(&route.id).await?;
    Ok(Json(RouteResponse { route, deliveries }))
}

async fn update_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RoutePayload>,
) -> ApiResult<Json<DeliveryRoute>> {
    validate_name("route_name", &payload.route_name)?;

    let mut route = state
        .db
        .delivery()
        .get_route(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Route not found: {id}")))?;

    route.route_name = payload.route_name.trim().to_string();
    route.driver_id = payload.driver_id;
    route.date = payload.date;
    route.status = payload.status;
    route.start_location = payload.start_location;
    route.end_location = payload.end_location;
    route.total_distance_km = payload.total_distance_km;
    route.estimated_duration = payload.estimated_duration;
    route.notes = payload.notes;

    state.db.delivery().update_route(&route).await?;
    Ok(Json(route))
}

async fn delete_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.delivery().delete_route(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_delivery_to_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AddDeliveryPayload>,
) -> ApiResult<(StatusCode, Json<RouteDelivery>)> {
    let stop = state
        .db
        .delivery()
        .add_delivery_to_route(&scope.company_id, &id, &payload.delivery_id, payload.sequence)
        .await?;

    Ok((StatusCode::CREATED, Json(stop)))
}

async fn start_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeliveryRoute>> {
    state.db.delivery().start_route(&scope.company_id, &id).await?;

    let route = state
        .db
        .delivery()
        .get_route(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Route not found: {id}")))?;
    Ok(Json(route))
}

async fn complete_route(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeliveryRoute>> {
    state.db.delivery().complete_route(&scope.company_id, &id).await?;

    let route = state
        .db
        .delivery()
        .get_route(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Route not found: {id}")))?;
    Ok(Json(route))
}
