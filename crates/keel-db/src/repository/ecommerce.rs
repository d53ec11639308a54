//! # E-commerce Repository
//!
//! Storefront categories, products, and orders. Orders write their lines
//! with the parent in one transaction.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{Category, Order, OrderItem, Product};

const CATEGORY_COLUMNS: &str = "id, company_id, name, slug, parent_id, description, \
     image_url, is_active, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, company_id, name, slug, sku, category_id, description, \
     price_cents, sale_price_cents, cost_cents, stock_quantity, images, is_active, \
     is_featured, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, company_id, order_number, customer_id, status, \
     subtotal_cents, tax_cents, shipping_cents, total_cents, shipping_address, \
     billing_address, notes, created_at, updated_at";

/// One storefront order line as submitted.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone)]
pub struct EcommerceRepository {
    pool: SqlitePool,
}

impl EcommerceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EcommerceRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    pub async fn list_categories(&self, company_id: &str) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_category(&self, company_id: &str, id: &str) -> DbResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(&format!(
            "INSERT INTO categories ({CATEGORY_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ))
        .bind(&category.id)
        .bind(&category.company_id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.parent_id)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_category(&self, category: &Category) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE categories SET name = ?3, slug = ?4, parent_id = ?5, description = ?6, \
             image_url = ?7, is_active = ?8, updated_at = ?9 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&category.id)
        .bind(&category.company_id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.parent_id)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    pub async fn delete_category(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub async fn list_products(&self, company_id: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_product(&self, company_id: &str, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ))
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.sale_price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_quantity)
        .bind(&product.images)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            "UPDATE products SET name = ?3, slug = ?4, sku = ?5, category_id = ?6, \
             description = ?7, price_cents = ?8, sale_price_cents = ?9, cost_cents = ?10, \
             stock_quantity = ?11, images = ?12, is_active = ?13, is_featured = ?14, \
             updated_at = ?15 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.sale_price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_quantity)
        .bind(&product.images)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    pub async fn delete_product(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn list_orders(&self, company_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_order(&self, company_id: &str, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_order_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, unit_price_cents, total_cents \
             FROM order_items WHERE order_id = ?1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_order(&self, order: &Order, lines: &[OrderLineInput]) -> DbResult<()> {
        debug!(order_number = %order.order_number, "Creating storefront order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ))
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_order_lines(&mut tx, &order.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_order(&self, order: &Order, lines: &[OrderLineInput]) -> DbResult<()> {
        debug!(id = %order.id, "Updating storefront order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET order_number = ?3, customer_id = ?4, status = ?5, \
             subtotal_cents = ?6, tax_cents = ?7, shipping_cents = ?8, total_cents = ?9, \
             shipping_address = ?10, billing_address = ?11, notes = ?12, updated_at = ?13 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.shipping_address)
        .bind(&order.billing_address)
        .bind(&order.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_order_lines(&mut tx, &order.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_order(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    async fn insert_order_lines(
        tx: &mut SqlxTransaction<'_, Sqlite>,
        order_id: &str,
        lines: &[OrderLineInput],
    ) -> DbResult<()> {
        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, \
                 unit_price_cents, total_cents) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(crate::generate_id())
            .bind(order_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.total_cents)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
