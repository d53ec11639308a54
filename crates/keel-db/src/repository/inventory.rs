//! # Inventory Repository
//!
//! Warehouses, items, per-warehouse stock, and the movement audit trail.
//!
//! Posting a movement through [`InventoryRepository::post_movement`] applies
//! it to the stock row in the same transaction, so the audit trail and the
//! quantities cannot drift apart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{Item, Stock, StockMovement, Warehouse};

const WAREHOUSE_COLUMNS: &str =
    "id, company_id, name, code, location, manager_id, is_active, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, company_id, name, sku, barcode, category, unit, min_stock, \
     max_stock, cost_cents, description, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, company_id, warehouse_id, item_id, movement_type, \
     quantity, reference_type, reference_number, date, notes, created_by, created_at, \
     updated_at";

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Warehouses
    // -------------------------------------------------------------------------

    pub async fn list_warehouses(&self, company_id: &str) -> DbResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(warehouses)
    }

    pub async fn get_warehouse(&self, company_id: &str, id: &str) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(warehouse)
    }

    pub async fn insert_warehouse(&self, warehouse: &Warehouse) -> DbResult<()> {
        debug!(code = %warehouse.code, "Inserting warehouse");

        sqlx::query(
            "INSERT INTO warehouses (id, company_id, name, code, location, manager_id, \
             is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&warehouse.id)
        .bind(&warehouse.company_id)
        .bind(&warehouse.name)
        .bind(&warehouse.code)
        .bind(&warehouse.location)
        .bind(&warehouse.manager_id)
        .bind(warehouse.is_active)
        .bind(warehouse.created_at)
        .bind(warehouse.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_warehouse(&self, warehouse: &Warehouse) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE warehouses SET name = ?3, code = ?4, location = ?5, manager_id = ?6, \
             is_active = ?7, updated_at = ?8 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&warehouse.id)
        .bind(&warehouse.company_id)
        .bind(&warehouse.name)
        .bind(&warehouse.code)
        .bind(&warehouse.location)
        .bind(&warehouse.manager_id)
        .bind(warehouse.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", &warehouse.id));
        }

        Ok(())
    }

    pub async fn delete_warehouse(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM warehouses WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    pub async fn list_items(&self, company_id: &str) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_item(&self, company_id: &str, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn insert_item(&self, item: &Item) -> DbResult<()> {
        debug!(sku = %item.sku, "Inserting item");

        sqlx::query(
            "INSERT INTO items (id, company_id, name, sku, barcode, category, unit, \
             min_stock, max_stock, cost_cents, description, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&item.id)
        .bind(&item.company_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.barcode)
        .bind(&item.category)
        .bind(item.unit)
        .bind(item.min_stock)
        .bind(item.max_stock)
        .bind(item.cost_cents)
        .bind(&item.description)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_item(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Updating item");

        let result = sqlx::query(
            "UPDATE items SET name = ?3, sku = ?4, barcode = ?5, category = ?6, unit = ?7, \
             min_stock = ?8, max_stock = ?9, cost_cents = ?10, description = ?11, \
             is_active = ?12, updated_at = ?13 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&item.id)
        .bind(&item.company_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.barcode)
        .bind(&item.category)
        .bind(item.unit)
        .bind(item.min_stock)
        .bind(item.max_stock)
        .bind(item.cost_cents)
        .bind(&item.description)
        .bind(item.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    pub async fn delete_item(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    /// All stock rows in the company's warehouses.
    pub async fn list_stocks(&self, company_id: &str) -> DbResult<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(
            "SELECT s.id, s.warehouse_id, s.item_id, s.quantity, s.reserved, \
             s.quantity - s.reserved AS available, s.created_at, s.updated_at \
             FROM stocks s INNER JOIN warehouses w ON w.id = s.warehouse_id \
             WHERE w.company_id = ?1 ORDER BY s.updated_at DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stocks)
    }

    pub async fn get_stock(&self, company_id: &str, id: &str) -> DbResult<Option<Stock>> {
        let stock = sqlx::query_as::<_, Stock>(
            "SELECT s.id, s.warehouse_id, s.item_id, s.quantity, s.reserved, \
             s.quantity - s.reserved AS available, s.created_at, s.updated_at \
             FROM stocks s INNER JOIN warehouses w ON w.id = s.warehouse_id \
             WHERE s.id = ?1 AND w.company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Sets a stock row's quantity/reserved directly (inventory count
    /// corrections). Upserts at (warehouse, item).
    pub async fn upsert_stock(
        &self,
        warehouse_id: &str,
        item_id: &str,
        quantity: i64,
        reserved: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO stocks (id, warehouse_id, item_id, quantity, reserved, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
             ON CONFLICT (warehouse_id, item_id) DO UPDATE SET \
             quantity = excluded.quantity, reserved = excluded.reserved, \
             updated_at = excluded.updated_at",
        )
        .bind(crate::generate_id())
        .bind(warehouse_id)
        .bind(item_id)
        .bind(quantity)
        .bind(reserved)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a stock row (e.g. after a warehouse stops carrying an item).
    pub async fn delete_stock(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM stocks WHERE id = ?1 AND warehouse_id IN \
             (SELECT id FROM warehouses WHERE company_id = ?2)",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Movements
    // -------------------------------------------------------------------------

    pub async fn list_movements(&self, company_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    pub async fn get_movement(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<StockMovement>> {
        let movement = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Records a movement and applies it to the stock row in one transaction.
    ///
    /// The stock row is upserted at zero if the (warehouse, item) pair has
    /// never held stock, then adjusted by the movement's signed delta.
    pub async fn post_movement(&self, movement: &StockMovement) -> DbResult<()> {
        debug!(
            item_id = %movement.item_id,
            warehouse_id = %movement.warehouse_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            "Posting stock movement"
        );

        let delta = movement.movement_type.signed_delta(movement.quantity);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO stock_movements (id, company_id, warehouse_id, item_id, \
             movement_type, quantity, reference_type, reference_number, date, notes, \
             created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&movement.id)
        .bind(&movement.company_id)
        .bind(&movement.warehouse_id)
        .bind(&movement.item_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(&movement.reference_type)
        .bind(&movement.reference_number)
        .bind(movement.date)
        .bind(&movement.notes)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .bind(movement.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO stocks (id, warehouse_id, item_id, quantity, reserved, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5) \
             ON CONFLICT (warehouse_id, item_id) DO UPDATE SET \
             quantity = quantity + ?4, updated_at = excluded.updated_at",
        )
        .bind(crate::generate_id())
        .bind(&movement.warehouse_id)
        .bind(&movement.item_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{seed_company, seed_item, seed_warehouse};
    use keel_core::{ItemUnit, MovementType};

    fn movement(
        company_id: &str,
        warehouse_id: &str,
        item_id: &str,
        movement_type: MovementType,
        quantity: i64,
    ) -> StockMovement {
        let now = Utc::now();
        StockMovement {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            item_id: item_id.to_string(),
            movement_type,
            quantity,
            reference_type: Some("manual".to_string()),
            reference_number: None,
            date: now,
            notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_post_movement_creates_and_adjusts_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        let repo = db.inventory();
        repo.post_movement(&movement(&company_id, &warehouse.id, &item.id, MovementType::In, 40))
            .await
            .unwrap();
        repo.post_movement(&movement(&company_id, &warehouse.id, &item.id, MovementType::Out, 15))
            .await
            .unwrap();

        let stocks = repo.list_stocks(&company_id).await.unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].quantity, 25);
        assert_eq!(stocks[0].available, 25);
        assert_eq!(repo.list_movements(&company_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_available_accounts_for_reservations() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        let repo = db.inventory();
        repo.upsert_stock(&warehouse.id, &item.id, 50, 20).await.unwrap();

        let stocks = repo.list_stocks(&company_id).await.unwrap();
        assert_eq!(stocks[0].quantity, 50);
        assert_eq!(stocks[0].reserved, 20);
        assert_eq!(stocks[0].available, 30);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        seed_item(&db, &company_id, "SKU-1").await;

        let now = Utc::now();
        let dup = Item {
            id: crate::generate_id(),
            company_id: company_id.clone(),
            name: "Duplicate".to_string(),
            sku: "SKU-1".to_string(),
            barcode: None,
            category: None,
            unit: ItemUnit::Piece,
            min_stock: 0,
            max_stock: 0,
            cost_cents: 0,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let err = db.inventory().insert_item(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_stock_invisible_across_companies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_a = seed_company(&db).await;
        let company_b =
            crate::repository::test_support::seed_company_named(&db, "other", "Other Co").await;

        let warehouse = seed_warehouse(&db, &company_a, "MAIN").await;
        let item = seed_item(&db, &company_a, "SKU-1").await;
        db.inventory()
            .upsert_stock(&warehouse.id, &item.id, 10, 0)
            .await
            .unwrap();

        assert_eq!(db.inventory().list_stocks(&company_a).await.unwrap().len(), 1);
        assert!(db.inventory().list_stocks(&company_b).await.unwrap().is_empty());
    }
}
