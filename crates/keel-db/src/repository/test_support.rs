//! Shared fixtures for repository tests.

use chrono::Utc;

use crate::pool::Database;
use keel_core::{Company, Item, ItemUnit, User, Warehouse};

/// Seeds a user and their company, returning the company id.
pub async fn seed_company(db: &Database) -> String {
    seed_company_named(db, "owner", "Test Co").await
}

/// Seeds a distinct user + company pair (for tenant-isolation tests).
pub async fn seed_company_named(db: &Database, username: &str, company_name: &str) -> String {
    let now = Utc::now();

    let user = User {
        id: crate::generate_id(),
        username: username.to_string(),
        email: None,
        full_name: None,
        password_hash: "hash".to_string(),
        active_company_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.users().insert(&user).await.unwrap();

    let company = Company {
        id: crate::generate_id(),
        owner_id: user.id.clone(),
        name: company_name.to_string(),
        address: None,
        phone: None,
        tax_id: None,
        registration_number: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.companies().insert(&company).await.unwrap();

    company.id
}

/// Seeds a warehouse in the company.
pub async fn seed_warehouse(db: &Database, company_id: &str, code: &str) -> Warehouse {
    let now = Utc::now();
    let warehouse = Warehouse {
        id: crate::generate_id(),
        company_id: company_id.to_string(),
        name: format!("Warehouse {code}"),
        code: code.to_string(),
        location: None,
        manager_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.inventory().insert_warehouse(&warehouse).await.unwrap();
    warehouse
}

/// Seeds an item in the company.
pub async fn seed_item(db: &Database, company_id: &str, sku: &str) -> Item {
    let now = Utc::now();
    let item = Item {
        id: crate::generate_id(),
        company_id: company_id.to_string(),
        name: format!("Item {sku}"),
        sku: sku.to_string(),
        barcode: None,
        category: None,
        unit: ItemUnit::Piece,
        min_stock: 0,
        max_stock: 0,
        cost_cents: 500,
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.inventory().insert_item(&item).await.unwrap();
    item
}
