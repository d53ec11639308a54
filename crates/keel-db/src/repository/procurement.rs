//! # Procurement Repository
//!
//! Suppliers, purchase orders, and goods receipts. Purchase orders and
//! receipts write their lines with the parent in one transaction.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{
    PurchaseOrder, PurchaseOrderItem, PurchaseReceipt, PurchaseReceiptItem, Supplier,
};

const SUPPLIER_COLUMNS: &str = "id, company_id, name, contact_person, email, phone, address, \
     tax_id, payment_terms, is_active, created_at, updated_at";

const PO_COLUMNS: &str = "id, company_id, po_number, supplier_id, date, \
     expected_delivery_date, status, subtotal_cents, tax_cents, shipping_cents, total_cents, \
     notes, created_by, created_at, updated_at";

const RECEIPT_COLUMNS: &str = "id, company_id, receipt_number, purchase_order_id, date, \
     received_by, notes, created_at, updated_at";

/// One purchase order line as submitted.
#[derive(Debug, Clone)]
pub struct PurchaseLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// One receipt line: the PO line it fulfils and the quantity received.
#[derive(Debug, Clone)]
pub struct ReceiptLineInput {
    pub po_item_id: String,
    pub quantity_received: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProcurementRepository {
    pool: SqlitePool,
}

impl ProcurementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProcurementRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    pub async fn list_suppliers(&self, company_id: &str) -> DbResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE company_id = ?1 ORDER BY name"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_supplier(&self, company_id: &str, id: &str) -> DbResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_supplier(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(name = %supplier.name, "Inserting supplier");

        sqlx::query(
            "INSERT INTO suppliers (id, company_id, name, contact_person, email, phone, \
             address, tax_id, payment_terms, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&supplier.id)
        .bind(&supplier.company_id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.tax_id)
        .bind(&supplier.payment_terms)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_supplier(&self, supplier: &Supplier) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET name = ?3, contact_person = ?4, email = ?5, phone = ?6, \
             address = ?7, tax_id = ?8, payment_terms = ?9, is_active = ?10, updated_at = ?11 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&supplier.id)
        .bind(&supplier.company_id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.tax_id)
        .bind(&supplier.payment_terms)
        .bind(supplier.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    pub async fn delete_supplier(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Purchase orders
    // -------------------------------------------------------------------------

    pub async fn list_orders(&self, company_id: &str) -> DbResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {PO_COLUMNS} FROM purchase_orders WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_order(&self, company_id: &str, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let row = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {PO_COLUMNS} FROM purchase_orders WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_order_items(&self, order_id: &str) -> DbResult<Vec<PurchaseOrderItem>> {
        let rows = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT id, purchase_order_id, item_id, quantity, unit_price_cents, total_cents \
             FROM purchase_order_items WHERE purchase_order_id = ?1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_order(
        &self,
        order: &PurchaseOrder,
        lines: &[PurchaseLineInput],
    ) -> DbResult<()> {
        debug!(po_number = %order.po_number, "Creating purchase order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO purchase_orders (id, company_id, po_number, supplier_id, date, \
             expected_delivery_date, status, subtotal_cents, tax_cents, shipping_cents, \
             total_cents, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.po_number)
        .bind(&order.supplier_id)
        .bind(order.date)
        .bind(order.expected_delivery_date)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_po_lines(&mut tx, &order.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_order(
        &self,
        order: &PurchaseOrder,
        lines: &[PurchaseLineInput],
    ) -> DbResult<()> {
        debug!(id = %order.id, "Updating purchase order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE purchase_orders SET po_number = ?3, supplier_id = ?4, date = ?5, \
             expected_delivery_date = ?6, status = ?7, subtotal_cents = ?8, tax_cents = ?9, \
             shipping_cents = ?10, total_cents = ?11, notes = ?12, updated_at = ?13 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.po_number)
        .bind(&order.supplier_id)
        .bind(order.date)
        .bind(order.expected_delivery_date)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase order", &order.id));
        }

        sqlx::query("DELETE FROM purchase_order_items WHERE purchase_order_id = ?1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_po_lines(&mut tx, &order.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_order(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM purchase_orders WHERE id = ?1 AND company_id = ?2")
                .bind(id)
                .bind(company_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase order", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Receipts
    // -------------------------------------------------------------------------

    pub async fn list_receipts(&self, company_id: &str) -> DbResult<Vec<PurchaseReceipt>> {
        let rows = sqlx::query_as::<_, PurchaseReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM purchase_receipts \
             WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_receipt(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<PurchaseReceipt>> {
        let row = sqlx::query_as::<_, PurchaseReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM purchase_receipts WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_receipt_items(&self, receipt_id: &str) -> DbResult<Vec<PurchaseReceiptItem>> {
        let rows = sqlx::query_as::<_, PurchaseReceiptItem>(
            "SELECT id, receipt_id, po_item_id, quantity_received, notes \
             FROM purchase_receipt_items WHERE receipt_id = ?1 ORDER BY id",
        )
        .bind(receipt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_receipt(
        &self,
        receipt: &PurchaseReceipt,
        lines: &[ReceiptLineInput],
    ) -> DbResult<()> {
        debug!(receipt_number = %receipt.receipt_number, "Creating purchase receipt");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO purchase_receipts (id, company_id, receipt_number, \
             purchase_order_id, date, received_by, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&receipt.id)
        .bind(&receipt.company_id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.purchase_order_id)
        .bind(receipt.date)
        .bind(&receipt.received_by)
        .bind(&receipt.notes)
        .bind(receipt.created_at)
        .bind(receipt.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO purchase_receipt_items (id, receipt_id, po_item_id, \
                 quantity_received, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(crate::generate_id())
            .bind(&receipt.id)
            .bind(&line.po_item_id)
            .bind(line.quantity_received)
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Updates a receipt header and replaces its lines transactionally.
    pub async fn update_receipt(
        &self,
        receipt: &PurchaseReceipt,
        lines: &[ReceiptLineInput],
    ) -> DbResult<()> {
        debug!(id = %receipt.id, "Updating purchase receipt");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE purchase_receipts SET receipt_number = ?3, purchase_order_id = ?4, \
             date = ?5, notes = ?6, updated_at = ?7 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&receipt.id)
        .bind(&receipt.company_id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.purchase_order_id)
        .bind(receipt.date)
        .bind(&receipt.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase receipt", &receipt.id));
        }

        sqlx::query("DELETE FROM purchase_receipt_items WHERE receipt_id = ?1")
            .bind(&receipt.id)
            .execute(&mut *tx)
            .await?;

        for line in lines {
            sqlx::query(
                "INSERT INTO purchase_receipt_items (id, receipt_id, po_item_id, \
                 quantity_received, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(crate::generate_id())
            .bind(&receipt.id)
            .bind(&line.po_item_id)
            .bind(line.quantity_received)
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_receipt(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM purchase_receipts WHERE id = ?1 AND company_id = ?2")
                .bind(id)
                .bind(company_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase receipt", id));
        }

        Ok(())
    }

    async fn insert_po_lines(
        tx: &mut SqlxTransaction<'_, Sqlite>,
        order_id: &str,
        lines: &[PurchaseLineInput],
    ) -> DbResult<()> {
        for line in lines {
            sqlx::query(
                "INSERT INTO purchase_order_items (id, purchase_order_id, item_id, quantity, \
                 unit_price_cents, total_cents) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(crate::generate_id())
            .bind(order_id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.total_cents)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
