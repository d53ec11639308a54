//! Contacts: the customers, suppliers, and partners a company deals with.
//! Referenced by sales documents, POS sales, deliveries, CRM opportunities,
//! and e-commerce orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Customer,
    Supplier,
    Partner,
    Other,
}

impl Default for ContactType {
    fn default() -> Self {
        ContactType::Customer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Contact {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// The contact's own organization, not the owning tenant.
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub website: Option<String>,
    pub contact_type: ContactType,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
