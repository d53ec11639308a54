//! # Stock Module
//!
//! Multi-warehouse stock availability and deduction planning.
//!
//! ## Deduction Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale line: 70 × SKU-WIDGET                                             │
//! │                                                                         │
//! │  Stock across warehouses (descending quantity):                         │
//! │    Main depot      on_hand 50  ──► take 50                             │
//! │    North shelf     on_hand 25  ──► take 20                             │
//! │    Returns cage    on_hand  5  ──► untouched                           │
//! │                                                                         │
//! │  Result: 2 allocations, 2 stock movements, each carrying the            │
//! │  sale number as reference. A void replays them with opposite sign.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The planner is pure: it receives a snapshot of the company's stock rows
//! and returns the allocation list. The repository applies the plan inside
//! the completing transaction, so the snapshot cannot go stale between plan
//! and apply.

use crate::error::{CoreError, CoreResult};

/// Snapshot of one stock row as seen by the planner.
#[derive(Debug, Clone)]
pub struct StockLevel {
    pub warehouse_id: String,
    /// On-hand quantity.
    pub quantity: i64,
    /// Quantity reserved by open documents.
    pub reserved: i64,
}

impl StockLevel {
    /// Available = quantity − reserved. Can be negative when a warehouse is
    /// over-reserved; the planner treats that as zero sellable.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved
    }
}

/// One warehouse's share of a planned deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub warehouse_id: String,
    pub quantity: i64,
}

/// Plans a stock deduction for one item across a company's warehouses.
///
/// Warehouses are consumed in descending on-hand-quantity order (ties broken
/// by warehouse id so the plan is deterministic) until `requested` is
/// satisfied. Rows with nothing available are skipped.
///
/// ## Errors
/// [`CoreError::InsufficientStock`] when the aggregate available quantity is
/// short of `requested`; the error carries the item's SKU for the message.
pub fn plan_deduction(sku: &str, levels: &[StockLevel], requested: i64) -> CoreResult<Vec<Allocation>> {
    let aggregate: i64 = levels.iter().map(|l| l.available().max(0)).sum();
    if aggregate < requested {
        return Err(CoreError::InsufficientStock {
            sku: sku.to_string(),
            available: aggregate,
            requested,
        });
    }

    let mut ordered: Vec<&StockLevel> = levels.iter().filter(|l| l.available() > 0).collect();
    ordered.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.warehouse_id.cmp(&b.warehouse_id))
    });

    let mut remaining = requested;
    let mut plan = Vec::new();

    for level in ordered {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(level.available());
        plan.push(Allocation {
            warehouse_id: level.warehouse_id.clone(),
            quantity: take,
        });
        remaining -= take;
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn level(id: &str, quantity: i64, reserved: i64) -> StockLevel {
        StockLevel {
            warehouse_id: id.to_string(),
            quantity,
            reserved,
        }
    }

    #[test]
    fn test_available_is_quantity_minus_reserved() {
        assert_eq!(level("w1", 10, 3).available(), 7);
        assert_eq!(level("w1", 10, 12).available(), -2);
    }

    #[test]
    fn test_single_warehouse_satisfies() {
        let levels = vec![level("w1", 50, 0)];
        let plan = plan_deduction("SKU-1", &levels, 20).unwrap();
        assert_eq!(
            plan,
            vec![Allocation {
                warehouse_id: "w1".to_string(),
                quantity: 20
            }]
        );
    }

    #[test]
    fn test_descending_quantity_order() {
        let levels = vec![level("small", 25, 0), level("big", 50, 0), level("tiny", 5, 0)];
        let plan = plan_deduction("SKU-1", &levels, 70).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].warehouse_id, "big");
        assert_eq!(plan[0].quantity, 50);
        assert_eq!(plan[1].warehouse_id, "small");
        assert_eq!(plan[1].quantity, 20);
    }

    #[test]
    fn test_exact_exhaustion() {
        let levels = vec![level("w1", 30, 0), level("w2", 20, 0)];
        let plan = plan_deduction("SKU-1", &levels, 50).unwrap();
        assert_eq!(plan.iter().map(|a| a.quantity).sum::<i64>(), 50);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_reserved_stock_not_sellable() {
        // 40 on hand but 35 reserved leaves only 5 sellable.
        let levels = vec![level("w1", 40, 35)];
        let err = plan_deduction("SKU-1", &levels, 10).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_aggregate_insufficiency() {
        let levels = vec![level("w1", 5, 0), level("w2", 3, 0)];
        let err = plan_deduction("SKU-9", &levels, 20).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "SKU-9");
                assert_eq!(available, 8);
                assert_eq!(requested, 20);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_over_reserved_warehouse_skipped() {
        let levels = vec![level("w1", 10, 12), level("w2", 10, 0)];
        let plan = plan_deduction("SKU-1", &levels, 10).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].warehouse_id, "w2");
    }

    #[test]
    fn test_quantity_ties_break_by_warehouse_id() {
        let levels = vec![level("w-b", 10, 0), level("w-a", 10, 0)];
        let plan = plan_deduction("SKU-1", &levels, 15).unwrap();
        assert_eq!(plan[0].warehouse_id, "w-a");
        assert_eq!(plan[1].warehouse_id, "w-b");
    }
}
