//! Inventory: warehouses, items, per-warehouse stock, and the stock movement
//! audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Warehouse
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: String,
    pub company_id: String,
    pub name: String,
    /// Unique per company.
    pub code: String,
    pub location: Option<String>,
    pub manager_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Item
// =============================================================================

/// Unit of measure for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ItemUnit {
    Piece,
    Kg,
    Liter,
    Meter,
    Box,
    Pack,
}

impl Default for ItemUnit {
    fn default() -> Self {
        ItemUnit::Piece
    }
}

/// A stockable item. `sku` is unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub unit: ItemUnit,
    pub min_stock: i64,
    pub max_stock: i64,
    pub cost_cents: i64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// Per-warehouse stock of one item. Unique per (warehouse, item).
///
/// `available` is computed in SQL as `quantity - reserved` so every read
/// carries it without a second query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Stock {
    pub id: String,
    pub warehouse_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub reserved: i64,
    /// quantity − reserved.
    pub available: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

impl MovementType {
    /// Sign applied to the stock quantity when the movement is posted.
    pub fn signed_delta(&self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
            // Transfers and adjustments carry their own sign in quantity.
            MovementType::Transfer | MovementType::Adjustment => quantity,
        }
    }
}

/// Audit record of one inventory quantity change. Quantities are stored
/// positive; `movement_type` carries the direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub company_id: String,
    pub warehouse_id: String,
    pub item_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    /// What produced the movement ("pos_sale", "pos_void", "manual", ...).
    pub reference_type: Option<String>,
    /// Document number of the producer (sale number, PO number, ...).
    pub reference_number: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_direction() {
        assert_eq!(MovementType::In.signed_delta(5), 5);
        assert_eq!(MovementType::Out.signed_delta(5), -5);
        assert_eq!(MovementType::Adjustment.signed_delta(-3), -3);
    }

    #[test]
    fn test_movement_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&MovementType::In).unwrap(), "\"in\"");
        assert_eq!(
            serde_json::to_string(&MovementType::Adjustment).unwrap(),
            "\"adjustment\""
        );
    }
}
