//! # Route Modules
//!
//! One module per ERP area, each assembling its own `Router` nested under
//! `/api/<module>`. Every data module follows the same list/create +
//! retrieve/update/delete pairing; workflow endpoints (POS completion,
//! delivery dispatch) sit alongside as POST actions.

pub mod accounting;
pub mod auth;
pub mod companies;
pub mod contacts;
pub mod crm;
pub mod delivery;
pub mod ecommerce;
pub mod hr;
pub mod inventory;
pub mod pos;
pub mod procurement;
pub mod sales;
pub mod website;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::AppState;

/// Assembles the full API surface.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/auth", auth::router())
        .nest("/api/companies/", companies::router())
        .nest("/api/contacts", contacts::router())
        .nest("/api/accounting", accounting::router())
        .nest("/api/inventory", inventory::router())
        .nest("/api/sales", sales::router())
        .nest("/api/procurement", procurement::router())
        .nest("/api/pos", pos::router())
        .nest("/api/hr", hr::router())
        .nest("/api/crm", crm::router())
        .nest("/api/delivery", delivery::router())
        .nest("/api/ecommerce", ecommerce::router())
        .nest("/api/website", website::router())
}

async fn healthz() -> impl IntoResponse {
    "ok"
}
