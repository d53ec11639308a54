//! Point of sale: completed sales, their line items, and payments.
//!
//! A POS sale is written in its final state - the completion workflow
//! (totals, stock deduction, numbering) runs in one transaction in the
//! repository, driven by [`crate::totals`] and [`crate::stock`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PosSaleStatus {
    Completed,
    Cancelled,
    Refunded,
}

impl Default for PosSaleStatus {
    fn default() -> Self {
        PosSaleStatus::Completed
    }
}

/// Payment instrument at the register (no cheques at the counter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PosPaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// A point-of-sale sale. `sale_number` is allocated from a per-company
/// sequence at completion time and is unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosSale {
    pub id: String,
    pub company_id: String,
    pub sale_number: String,
    pub date: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PosPaymentMethod,
    pub status: PosSaleStatus,
    pub cashier_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosSaleItem {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

/// A payment towards a sale; split tenders produce several rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosPayment {
    pub id: String,
    pub sale_id: String,
    pub amount_cents: i64,
    pub payment_method: PosPaymentMethod,
    pub reference: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
