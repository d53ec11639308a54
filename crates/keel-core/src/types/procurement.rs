//! Procurement: suppliers, purchase orders, and goods receipts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    Confirmed,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: String,
    pub company_id: String,
    pub po_number: String,
    pub supplier_id: String,
    pub date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderItem {
    pub id: String,
    pub purchase_order_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// Goods receipt against a purchase order. Items reference the PO line they
/// fulfil with the quantity actually received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReceipt {
    pub id: String,
    pub company_id: String,
    pub receipt_number: String,
    pub purchase_order_id: String,
    pub date: NaiveDate,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReceiptItem {
    pub id: String,
    pub receipt_id: String,
    pub po_item_id: String,
    pub quantity_received: i64,
    pub notes: Option<String>,
}
