//! Delivery logistics: drivers, deliveries, and routes.
//!
//! Routes order their stops through [`RouteDelivery`] rows with an explicit
//! sequence; the workflow endpoints (assign driver, start/complete route)
//! only move statuses and stamp timestamps.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    Busy,
    OffDuty,
}

impl Default for DriverStatus {
    fn default() -> Self {
        DriverStatus::Available
    }
}

/// A delivery driver. Phone is unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Driver {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_plate: Option<String>,
    pub license_number: Option<String>,
    pub status: DriverStatus,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
    Failed,
}

impl DeliveryStatus {
    /// Statuses counted as "on the road" by the in-transit listing.
    pub fn is_in_transit(&self) -> bool {
        matches!(self, DeliveryStatus::PickedUp | DeliveryStatus::InTransit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Delivery {
    pub id: String,
    pub company_id: String,
    pub delivery_number: String,
    pub sales_order_id: Option<String>,
    pub customer_id: String,
    pub driver_id: Option<String>,
    pub pickup_address: String,
    pub delivery_address: String,
    pub customer_phone: Option<String>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<NaiveTime>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    pub priority: i64,
    /// Kilometers, when known.
    pub distance_km: Option<i64>,
    pub delivery_fee_cents: i64,
    pub tracking_code: Option<String>,
    /// Recipient signature, base64-encoded by the capturing client.
    pub signature: Option<String>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeliveryItem {
    pub id: String,
    pub delivery_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub description: Option<String>,
    pub condition_on_delivery: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeliveryRoute {
    pub id: String,
    pub company_id: String,
    pub route_name: String,
    pub driver_id: Option<String>,
    pub date: NaiveDate,
    pub status: RouteStatus,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub total_distance_km: i64,
    /// Minutes.
    pub estimated_duration: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stop on a route. Unique per (route, delivery), ordered by `sequence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RouteDelivery {
    pub id: String,
    pub route_id: String,
    pub delivery_id: String,
    pub sequence: i64,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_transit_statuses() {
        assert!(DeliveryStatus::PickedUp.is_in_transit());
        assert!(DeliveryStatus::InTransit.is_in_transit());
        assert!(!DeliveryStatus::Pending.is_in_transit());
        assert!(!DeliveryStatus::Delivered.is_in_transit());
    }
}
