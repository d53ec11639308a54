//! End-to-end contract tests for the API surface: auth, active-company
//! scoping, tenant isolation, and the two workflow endpoints (journal
//! entries, POS completion), driven through the router with in-process
//! requests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use keel_api::routes::api_router;
use keel_api::{ApiConfig, AppState};
use keel_db::{Database, DbConfig};

// =============================================================================
// Harness
// =============================================================================

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig {
        http_port: 0,
        database_path: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_access_lifetime_secs: 3600,
        jwt_refresh_lifetime_secs: 86400,
    };
    api_router().with_state(AppState::new(db, config))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Registers a user; returns their access token.
async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": username, "password": "correct-horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["access_token"].as_str().unwrap().to_string()
}

/// Registers a user and creates their company (which becomes active).
async fn register_with_company(app: &Router, username: &str, company: &str) -> String {
    let token = register(app, username).await;
    let (status, _) = send(
        app,
        "POST",
        "/api/companies/",
        Some(&token),
        Some(json!({"name": company})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    token
}

/// Creates a warehouse and an item, stocks the item via an `in` movement,
/// and returns (warehouse_id, item_id).
async fn stocked_item(app: &Router, token: &str, sku: &str, quantity: i64) -> (String, String) {
    let (status, warehouse) = send(
        app,
        "POST",
        "/api/inventory/warehouses",
        Some(token),
        Some(json!({"name": "Main depot", "code": "MAIN"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    let (status, item) = send(
        app,
        "POST",
        "/api/inventory/items",
        Some(token),
        Some(json!({"name": format!("Item {sku}"), "sku": sku, "cost_cents": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        "POST",
        "/api/inventory/stock-movements",
        Some(token),
        Some(json!({
            "warehouse_id": warehouse_id,
            "item_id": item_id,
            "movement_type": "in",
            "quantity": quantity,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (warehouse_id, item_id)
}

// =============================================================================
// Auth & scoping
// =============================================================================

#[tokio::test]
async fn healthz_is_public() {
    let app = test_app().await;
    let (status, _) = send(&app, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn data_endpoints_require_auth() {
    let app = test_app().await;
    let (status, _) = send(&app, "GET", "/api/inventory/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn data_endpoints_require_active_company() {
    let app = test_app().await;
    let token = register(&app, "loner").await;

    let (status, body) = send(&app, "GET", "/api/inventory/items", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "no_active_company");
}

#[tokio::test]
async fn login_roundtrip() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_company_rejected() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "First Co").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/companies/",
        Some(&token),
        Some(json!({"name": "Second Co"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn records_invisible_across_tenants() {
    let app = test_app().await;
    let alice = register_with_company(&app, "alice", "Alice Co").await;
    let bob = register_with_company(&app, "bob", "Bob Co").await;

    let (_, item) = send(
        &app,
        "POST",
        "/api/inventory/items",
        Some(&alice),
        Some(json!({"name": "Widget", "sku": "WID-1"})),
    )
    .await;
    let item_id = item["id"].as_str().unwrap();

    // Bob sees neither the listing entry nor the detail.
    let (status, listing) = send(&app, "GET", "/api/inventory/items", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/inventory/items/{item_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;

    let payload = json!({"name": "Widget", "sku": "WID-1"});
    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory/items",
        Some(&token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory/items",
        Some(&token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Accounting
// =============================================================================

async fn seed_accounts(app: &Router, token: &str) -> (String, String) {
    let (_, cash) = send(
        app,
        "POST",
        "/api/accounting/accounts",
        Some(token),
        Some(json!({"code": "1000", "name": "Cash", "account_type": "asset"})),
    )
    .await;
    let (_, rent) = send(
        app,
        "POST",
        "/api/accounting/accounts",
        Some(token),
        Some(json!({"code": "6200", "name": "Rent expense", "account_type": "expense"})),
    )
    .await;
    (
        cash["id"].as_str().unwrap().to_string(),
        rent["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn balanced_journal_entry_accepted() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;
    let (cash, rent) = seed_accounts(&app, &token).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/accounting/journal-entries",
        Some(&token),
        Some(json!({
            "entry_number": "JE-20260807-0001",
            "date": "2026-08-07",
            "description": "Office rent",
            "status": "posted",
            "lines": [
                {"account_id": rent, "debit_cents": 120000},
                {"account_id": cash, "credit_cents": 120000},
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unbalanced_journal_entry_rejected() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;
    let (cash, rent) = seed_accounts(&app, &token).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/accounting/journal-entries",
        Some(&token),
        Some(json!({
            "entry_number": "JE-20260807-0001",
            "date": "2026-08-07",
            "description": "Office rent",
            "status": "posted",
            "lines": [
                {"account_id": rent, "debit_cents": 120000},
                {"account_id": cash, "credit_cents": 115000},
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not balanced"));

    // Nothing was written.
    let (_, listing) = send(
        &app,
        "GET",
        "/api/accounting/journal-entries",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

// =============================================================================
// Point of sale
// =============================================================================

#[tokio::test]
async fn pos_sale_completes_and_deducts_stock() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;
    let (_, item_id) = stocked_item(&app, &token, "WID-1", 50).await;

    let (status, sale) = send(
        &app,
        "POST",
        "/api/pos/sales",
        Some(&token),
        Some(json!({
            "payment_method": "cash",
            "items": [
                {"item_id": item_id, "quantity": 10, "unit_price_cents": 1000},
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["status"], "completed");
    assert_eq!(sale["total_cents"], 10_000);
    assert!(sale["sale_number"].as_str().unwrap().starts_with("POS-"));
    assert_eq!(sale["payments"].as_array().unwrap().len(), 1);

    let (_, stocks) = send(&app, "GET", "/api/inventory/stocks", Some(&token), None).await;
    assert_eq!(stocks[0]["quantity"], 40);
    assert_eq!(stocks[0]["available"], 40);
}

#[tokio::test]
async fn pos_sale_rejected_on_insufficient_stock() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;
    let (_, item_id) = stocked_item(&app, &token, "WID-1", 5).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/pos/sales",
        Some(&token),
        Some(json!({
            "payment_method": "cash",
            "items": [
                {"item_id": item_id, "quantity": 10, "unit_price_cents": 1000},
            ],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Insufficient stock"));

    // Stock untouched, no sale recorded.
    let (_, stocks) = send(&app, "GET", "/api/inventory/stocks", Some(&token), None).await;
    assert_eq!(stocks[0]["quantity"], 5);
    let (_, sales) = send(&app, "GET", "/api/pos/sales", Some(&token), None).await;
    assert_eq!(sales.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn pos_void_restores_stock() {
    let app = test_app().await;
    let token = register_with_company(&app, "alice", "Alice Co").await;
    let (_, item_id) = stocked_item(&app, &token, "WID-1", 50).await;

    let (_, sale) = send(
        &app,
        "POST",
        "/api/pos/sales",
        Some(&token),
        Some(json!({
            "payment_method": "card",
            "items": [
                {"item_id": item_id, "quantity": 10, "unit_price_cents": 1000},
            ],
        })),
    )
    .await;
    let sale_id = sale["id"].as_str().unwrap();

    let (status, voided) = send(
        &app,
        "POST",
        &format!("/api/pos/sales/{sale_id}/void"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voided["status"], "cancelled");

    let (_, stocks) = send(&app, "GET", "/api/inventory/stocks", Some(&token), None).await;
    assert_eq!(stocks[0]["quantity"], 50);

    // Voiding again is a 400.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/pos/sales/{sale_id}/void"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Website (public surface)
// =============================================================================

#[tokio::test]
async fn contact_form_is_public_but_inbox_is_not() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/website/messages",
        None,
        Some(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Hello",
            "message": "Interested in your products.",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "GET", "/api/website/messages", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "staff").await;
    let (status, inbox) = send(&app, "GET", "/api/website/messages", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox.as_array().unwrap().len(), 1);
}
