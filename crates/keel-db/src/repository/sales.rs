//! # Sales Repository
//!
//! Quotations, sales orders, invoices, and invoice payments.
//!
//! The three line-item documents share one shape: the parent row carries the
//! totals, the lines live in a child table and are always written with the
//! parent in one transaction (an update replaces the full line set).
//! Recording a payment bumps the invoice's paid amount and flips it to paid
//! when the balance reaches zero.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{
    Invoice, InvoiceItem, InvoiceStatus, Payment, Quotation, QuotationItem, SalesOrder,
    SalesOrderItem,
};

const QUOTATION_COLUMNS: &str = "id, company_id, quote_number, customer_id, date, \
     valid_until, status, subtotal_cents, discount_cents, tax_cents, total_cents, terms, \
     notes, created_by, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, company_id, order_number, quotation_id, customer_id, date, \
     delivery_date, status, subtotal_cents, discount_cents, tax_cents, total_cents, notes, \
     created_by, created_at, updated_at";

const INVOICE_COLUMNS: &str = "id, company_id, invoice_number, sales_order_id, customer_id, \
     date, due_date, status, subtotal_cents, discount_cents, tax_cents, total_cents, \
     paid_amount_cents, total_cents - paid_amount_cents AS balance_cents, notes, created_by, \
     created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, company_id, invoice_id, payment_number, date, \
     amount_cents, payment_method, reference, notes, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, item_id, description, quantity, unit_price_cents, discount_cents, total_cents";

/// One line of a quotation, order, or invoice, as submitted by the client.
/// Totals come from the client and are persisted as-is, like the rest of the
/// document's money fields.
#[derive(Debug, Clone)]
pub struct SalesLineInput {
    pub item_id: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Quotations
    // -------------------------------------------------------------------------

    pub async fn list_quotations(&self, company_id: &str) -> DbResult<Vec<Quotation>> {
        let rows = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_quotation(&self, company_id: &str, id: &str) -> DbResult<Option<Quotation>> {
        let row = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_quotation_items(&self, quotation_id: &str) -> DbResult<Vec<QuotationItem>> {
        let rows = sqlx::query_as::<_, QuotationItem>(&format!(
            "SELECT quotation_id, {LINE_COLUMNS} FROM quotation_items \
             WHERE quotation_id = ?1 ORDER BY id"
        ))
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_quotation(
        &self,
        quotation: &Quotation,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(quote_number = %quotation.quote_number, "Creating quotation");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quotations (id, company_id, quote_number, customer_id, date, \
             valid_until, status, subtotal_cents, discount_cents, tax_cents, total_cents, \
             terms, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&quotation.id)
        .bind(&quotation.company_id)
        .bind(&quotation.quote_number)
        .bind(&quotation.customer_id)
        .bind(quotation.date)
        .bind(quotation.valid_until)
        .bind(quotation.status)
        .bind(quotation.subtotal_cents)
        .bind(quotation.discount_cents)
        .bind(quotation.tax_cents)
        .bind(quotation.total_cents)
        .bind(&quotation.terms)
        .bind(&quotation.notes)
        .bind(&quotation.created_by)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, "quotation_items", "quotation_id", &quotation.id, lines)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_quotation(
        &self,
        quotation: &Quotation,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(id = %quotation.id, "Updating quotation");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE quotations SET quote_number = ?3, customer_id = ?4, date = ?5, \
             valid_until = ?6, status = ?7, subtotal_cents = ?8, discount_cents = ?9, \
             tax_cents = ?10, total_cents = ?11, terms = ?12, notes = ?13, updated_at = ?14 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&quotation.id)
        .bind(&quotation.company_id)
        .bind(&quotation.quote_number)
        .bind(&quotation.customer_id)
        .bind(quotation.date)
        .bind(quotation.valid_until)
        .bind(quotation.status)
        .bind(quotation.subtotal_cents)
        .bind(quotation.discount_cents)
        .bind(quotation.tax_cents)
        .bind(quotation.total_cents)
        .bind(&quotation.terms)
        .bind(&quotation.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quotation", &quotation.id));
        }

        sqlx::query("DELETE FROM quotation_items WHERE quotation_id = ?1")
            .bind(&quotation.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, "quotation_items", "quotation_id", &quotation.id, lines)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_quotation(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM quotations WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quotation", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sales orders
    // -------------------------------------------------------------------------

    pub async fn list_orders(&self, company_id: &str) -> DbResult<Vec<SalesOrder>> {
        let rows = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_order(&self, company_id: &str, id: &str) -> DbResult<Option<SalesOrder>> {
        let row = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_order_items(&self, order_id: &str) -> DbResult<Vec<SalesOrderItem>> {
        let rows = sqlx::query_as::<_, SalesOrderItem>(&format!(
            "SELECT sales_order_id, {LINE_COLUMNS} FROM sales_order_items \
             WHERE sales_order_id = ?1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_order(
        &self,
        order: &SalesOrder,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(order_number = %order.order_number, "Creating sales order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sales_orders (id, company_id, order_number, quotation_id, \
             customer_id, date, delivery_date, status, subtotal_cents, discount_cents, \
             tax_cents, total_cents, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.order_number)
        .bind(&order.quotation_id)
        .bind(&order.customer_id)
        .bind(order.date)
        .bind(order.delivery_date)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(&order.created_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, "sales_order_items", "sales_order_id", &order.id, lines)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_order(
        &self,
        order: &SalesOrder,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(id = %order.id, "Updating sales order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sales_orders SET order_number = ?3, quotation_id = ?4, customer_id = ?5, \
             date = ?6, delivery_date = ?7, status = ?8, subtotal_cents = ?9, \
             discount_cents = ?10, tax_cents = ?11, total_cents = ?12, notes = ?13, \
             updated_at = ?14 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.order_number)
        .bind(&order.quotation_id)
        .bind(&order.customer_id)
        .bind(order.date)
        .bind(order.delivery_date)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sales order", &order.id));
        }

        sqlx::query("DELETE FROM sales_order_items WHERE sales_order_id = ?1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, "sales_order_items", "sales_order_id", &order.id, lines)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_order(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales_orders WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sales order", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    pub async fn list_invoices(&self, company_id: &str) -> DbResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_invoice(&self, company_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_invoice_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let rows = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT invoice_id, {LINE_COLUMNS} FROM invoice_items \
             WHERE invoice_id = ?1 ORDER BY id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_invoice(
        &self,
        invoice: &Invoice,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(invoice_number = %invoice.invoice_number, "Creating invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO invoices (id, company_id, invoice_number, sales_order_id, \
             customer_id, date, due_date, status, subtotal_cents, discount_cents, tax_cents, \
             total_cents, paid_amount_cents, notes, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(&invoice.id)
        .bind(&invoice.company_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.sales_order_id)
        .bind(&invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.status)
        .bind(invoice.subtotal_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.total_cents)
        .bind(invoice.paid_amount_cents)
        .bind(&invoice.notes)
        .bind(&invoice.created_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_lines(&mut tx, "invoice_items", "invoice_id", &invoice.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_invoice(
        &self,
        invoice: &Invoice,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        debug!(id = %invoice.id, "Updating invoice");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE invoices SET invoice_number = ?3, sales_order_id = ?4, customer_id = ?5, \
             date = ?6, due_date = ?7, status = ?8, subtotal_cents = ?9, discount_cents = ?10, \
             tax_cents = ?11, total_cents = ?12, notes = ?13, updated_at = ?14 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&invoice.id)
        .bind(&invoice.company_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.sales_order_id)
        .bind(&invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.status)
        .bind(invoice.subtotal_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.total_cents)
        .bind(&invoice.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_lines(&mut tx, "invoice_items", "invoice_id", &invoice.id, lines).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_invoice(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    pub async fn list_payments(&self, company_id: &str) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_payment(&self, company_id: &str, id: &str) -> DbResult<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Records a payment and rolls it into the invoice's paid amount; the
    /// invoice flips to paid once the balance reaches zero.
    pub async fn record_payment(&self, payment: &Payment) -> DbResult<()> {
        debug!(payment_number = %payment.payment_number, amount = payment.amount_cents, "Recording payment");

        let mut tx = self.pool.begin().await?;

        // The invoice must exist in the same company.
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(&payment.invoice_id)
        .bind(&payment.company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", &payment.invoice_id))?;

        sqlx::query(
            "INSERT INTO payments (id, company_id, invoice_id, payment_number, date, \
             amount_cents, payment_method, reference, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&payment.id)
        .bind(&payment.company_id)
        .bind(&payment.invoice_id)
        .bind(&payment.payment_number)
        .bind(payment.date)
        .bind(payment.amount_cents)
        .bind(payment.payment_method)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await?;

        let new_paid = invoice.paid_amount_cents + payment.amount_cents;
        let new_status = if new_paid >= invoice.total_cents {
            InvoiceStatus::Paid
        } else {
            invoice.status
        };

        sqlx::query(
            "UPDATE invoices SET paid_amount_cents = ?2, status = ?3, updated_at = ?4 \
             WHERE id = ?1",
        )
        .bind(&payment.invoice_id)
        .bind(new_paid)
        .bind(new_status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a payment and backs it out of the invoice's paid amount.
    pub async fn delete_payment(&self, company_id: &str, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Payment", id))?;

        sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE invoices SET paid_amount_cents = paid_amount_cents - ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(&payment.invoice_id)
        .bind(payment.amount_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Inserts line rows for one of the three document tables. The tables
    /// share a column layout apart from the parent-id column name.
    async fn insert_lines(
        tx: &mut SqlxTransaction<'_, Sqlite>,
        table: &str,
        parent_column: &str,
        parent_id: &str,
        lines: &[SalesLineInput],
    ) -> DbResult<()> {
        for line in lines {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, {parent_column}, item_id, description, quantity, \
                 unit_price_cents, discount_cents, total_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))
            .bind(crate::generate_id())
            .bind(parent_id)
            .bind(&line.item_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.discount_cents)
            .bind(line.total_cents)
            .execute(&mut **tx)
            .await?;
        }

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
    use crate::repository::test_support::{seed_company, seed_item};
    use chrono::NaiveDate;
    use keel_core::{Contact, ContactType, PaymentMethod};

    async fn seed_contact(db: &Database, company_id: &str) -> Contact {
        let now = Utc::now();
        let contact = Contact {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            name: "Customer".to_string(),
            email: None,
            phone: None,
            mobile: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            company_name: None,
            position: None,
            website: None,
            contact_type: ContactType::Customer,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.contacts().insert(&contact).await.unwrap();
        contact
    }

    fn invoice(company_id: &str, customer_id: &str, total_cents: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            invoice_number: "INV-20260807-0001".to_string(),
            sales_order_id: None,
            customer_id: customer_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            status: InvoiceStatus::Sent,
            subtotal_cents: total_cents,
            discount_cents: 0,
            tax_cents: 0,
            total_cents,
            paid_amount_cents: 0,
            balance_cents: total_cents,
            notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(company_id: &str, invoice_id: &str, number: &str, amount_cents: i64) -> Payment {
        let now = Utc::now();
        Payment {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            invoice_id: invoice_id.to_string(),
            payment_number: number.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            amount_cents,
            payment_method: PaymentMethod::Transfer,
            reference: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_invoice_with_lines_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        let inv = invoice(&company_id, &customer.id, 5000);
        let lines = vec![SalesLineInput {
            item_id: item.id.clone(),
            description: None,
            quantity: 5,
            unit_price_cents: 1000,
            discount_cents: 0,
            total_cents: 5000,
        }];
        db.sales().create_invoice(&inv, &lines).await.unwrap();

        let fetched = db.sales().get_invoice(&company_id, &inv.id).await.unwrap().unwrap();
        assert_eq!(fetched.balance_cents, 5000);
        assert_eq!(db.sales().get_invoice_items(&inv.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_rolls_into_balance_and_flips_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;

        let inv = invoice(&company_id, &customer.id, 5000);
        db.sales().create_invoice(&inv, &[]).await.unwrap();

        db.sales()
            .record_payment(&payment(&company_id, &inv.id, "PAY-0001", 2000))
            .await
            .unwrap();
        let after_first = db.sales().get_invoice(&company_id, &inv.id).await.unwrap().unwrap();
        assert_eq!(after_first.paid_amount_cents, 2000);
        assert_eq!(after_first.balance_cents, 3000);
        assert_eq!(after_first.status, InvoiceStatus::Sent);

        db.sales()
            .record_payment(&payment(&company_id, &inv.id, "PAY-0002", 3000))
            .await
            .unwrap();
        let settled = db.sales().get_invoice(&company_id, &inv.id).await.unwrap().unwrap();
        assert_eq!(settled.balance_cents, 0);
        assert_eq!(settled.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_delete_payment_backs_out_paid_amount() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let customer = seed_contact(&db, &company_id).await;

        let inv = invoice(&company_id, &customer.id, 5000);
        db.sales().create_invoice(&inv, &[]).await.unwrap();

        let pay = payment(&company_id, &inv.id, "PAY-0001", 2000);
        db.sales().record_payment(&pay).await.unwrap();
        db.sales().delete_payment(&company_id, &pay.id).await.unwrap();

        let restored = db.sales().get_invoice(&company_id, &inv.id).await.unwrap().unwrap();
        assert_eq!(restored.paid_amount_cents, 0);
    }
}
