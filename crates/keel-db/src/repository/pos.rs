//! # POS Repository
//!
//! The point-of-sale completion and void workflows, plus sale reads.
//!
//! ## Sale Completion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale (ONE database transaction)                               │
//! │                                                                         │
//! │  1. compute totals          ← keel-core::totals                        │
//! │  2. allocate sale number    ← max(sequence) + 1 for today's prefix;    │
//! │                               the UNIQUE (company, sale_number) index  │
//! │                               aborts the transaction on a lost race    │
//! │  3. per line:                                                           │
//! │       load company stock rows for the item                             │
//! │       plan deduction        ← keel-core::stock (descending quantity)   │
//! │       apply plan            ← UPDATE stocks, one per warehouse         │
//! │       write movements       ← one 'out' row per warehouse touched,     │
//! │                               reference = sale number                  │
//! │  4. insert sale + items + payments                                      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  void_sale replays the recorded movements with opposite direction      │
//! │  ('in', reference_type 'pos_void') and marks the sale cancelled.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::numbering;
use keel_core::stock::{plan_deduction, StockLevel};
use keel_core::totals::{compute_totals, LineAmounts};
use keel_core::{CoreError, PosPayment, PosPaymentMethod, PosSale, PosSaleItem, PosSaleStatus};

const SALE_COLUMNS: &str = "id, company_id, sale_number, date, customer_id, subtotal_cents, \
     discount_cents, tax_cents, total_cents, payment_method, status, cashier_id, notes, \
     created_at, updated_at";

const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, item_id, quantity, unit_price_cents, discount_cents, total_cents";

const PAYMENT_COLUMNS: &str =
    "id, sale_id, amount_cents, payment_method, reference, date, created_at, updated_at";

// =============================================================================
// Inputs
// =============================================================================

/// One line of a sale as rung up at the register.
#[derive(Debug, Clone)]
pub struct PosSaleLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

/// One tender of a (possibly split) payment.
#[derive(Debug, Clone)]
pub struct PosTenderInput {
    pub amount_cents: i64,
    pub payment_method: PosPaymentMethod,
    pub reference: Option<String>,
}

/// A sale as submitted for completion.
#[derive(Debug, Clone)]
pub struct PosSaleInput {
    pub customer_id: Option<String>,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub payment_method: PosPaymentMethod,
    pub notes: Option<String>,
    pub lines: Vec<PosSaleLineInput>,
    /// Explicit tenders; empty means one payment of the full total in the
    /// sale's payment method.
    pub payments: Vec<PosTenderInput>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct PosRepository {
    pool: SqlitePool,
}

impl PosRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PosRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn list_sales(&self, company_id: &str) -> DbResult<Vec<PosSale>> {
        let sales = sqlx::query_as::<_, PosSale>(&format!(
            "SELECT {SALE_COLUMNS} FROM pos_sales WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    pub async fn get_sale(&self, company_id: &str, id: &str) -> DbResult<Option<PosSale>> {
        let sale = sqlx::query_as::<_, PosSale>(&format!(
            "SELECT {SALE_COLUMNS} FROM pos_sales WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    pub async fn get_sale_items(&self, sale_id: &str) -> DbResult<Vec<PosSaleItem>> {
        let items = sqlx::query_as::<_, PosSaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM pos_sale_items WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_sale_payments(&self, sale_id: &str) -> DbResult<Vec<PosPayment>> {
        let payments = sqlx::query_as::<_, PosPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM pos_payments WHERE sale_id = ?1 ORDER BY date"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Completes a sale: totals, numbering, stock deduction, movement audit,
    /// and payment rows, all inside one transaction.
    pub async fn complete_sale(
        &self,
        company_id: &str,
        cashier_id: Option<&str>,
        input: PosSaleInput,
    ) -> DbResult<PosSale> {
        let line_amounts: Vec<LineAmounts> = input
            .lines
            .iter()
            .map(|l| LineAmounts {
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
                discount_cents: l.discount_cents,
            })
            .collect();
        let (line_totals, subtotal_cents, total_cents) =
            compute_totals(&line_amounts, input.discount_cents, input.tax_cents)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sale_number = self
            .next_sale_number(&mut tx, company_id, now.date_naive())
            .await?;

        debug!(sale_number = %sale_number, lines = input.lines.len(), "Completing POS sale");

        // Deduct stock line by line; later lines for the same item see the
        // quantities already taken by earlier ones.
        for line in &input.lines {
            self.deduct_line(&mut tx, company_id, cashier_id, &sale_number, line, now)
                .await?;
        }

        let sale = PosSale {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            sale_number,
            date: now,
            customer_id: input.customer_id.clone(),
            subtotal_cents,
            discount_cents: input.discount_cents,
            tax_cents: input.tax_cents,
            total_cents,
            payment_method: input.payment_method,
            status: PosSaleStatus::Completed,
            cashier_id: cashier_id.map(String::from),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO pos_sales (id, company_id, sale_number, date, customer_id, \
             subtotal_cents, discount_cents, tax_cents, total_cents, payment_method, \
             status, cashier_id, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&sale.id)
        .bind(&sale.company_id)
        .bind(&sale.sale_number)
        .bind(sale.date)
        .bind(&sale.customer_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(&sale.cashier_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for (line, line_total) in input.lines.iter().zip(line_totals.iter()) {
            sqlx::query(
                "INSERT INTO pos_sale_items (id, sale_id, item_id, quantity, \
                 unit_price_cents, discount_cents, total_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(crate::generate_id())
            .bind(&sale.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.discount_cents)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;
        }

        // No explicit tenders: one payment of the full total.
        let payments = if input.payments.is_empty() {
            vec![PosTenderInput {
                amount_cents: total_cents,
                payment_method: input.payment_method,
                reference: None,
            }]
        } else {
            input.payments
        };

        for tender in &payments {
            sqlx::query(
                "INSERT INTO pos_payments (id, sale_id, amount_cents, payment_method, \
                 reference, date, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(crate::generate_id())
            .bind(&sale.id)
            .bind(tender.amount_cents)
            .bind(tender.payment_method)
            .bind(&tender.reference)
            .bind(now)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(sale)
    }

    /// Voids a completed sale: replays its movements with opposite direction
    /// and marks it cancelled, in one transaction.
    pub async fn void_sale(&self, company_id: &str, id: &str) -> DbResult<PosSale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, PosSale>(&format!(
            "SELECT {SALE_COLUMNS} FROM pos_sales WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("POS sale", id))?;

        if sale.status != PosSaleStatus::Completed {
            return Err(CoreError::InvalidStatus {
                entity: "POS sale",
                status: format!("{:?}", sale.status).to_lowercase(),
                operation: "void",
            }
            .into());
        }

        debug!(sale_number = %sale.sale_number, "Voiding POS sale");

        // The original deduction, one row per warehouse touched.
        let movements: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT warehouse_id, item_id, quantity FROM stock_movements \
             WHERE company_id = ?1 AND reference_type = 'pos_sale' \
             AND reference_number = ?2 AND movement_type = 'out'",
        )
        .bind(company_id)
        .bind(&sale.sale_number)
        .fetch_all(&mut *tx)
        .await?;

        for (warehouse_id, item_id, quantity) in &movements {
            sqlx::query(
                "UPDATE stocks SET quantity = quantity + ?3, updated_at = ?4 \
                 WHERE warehouse_id = ?1 AND item_id = ?2",
            )
            .bind(warehouse_id)
            .bind(item_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO stock_movements (id, company_id, warehouse_id, item_id, \
                 movement_type, quantity, reference_type, reference_number, date, notes, \
                 created_by, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, 'in', ?5, 'pos_void', ?6, ?7, NULL, NULL, ?7, ?7)",
            )
            .bind(crate::generate_id())
            .bind(company_id)
            .bind(warehouse_id)
            .bind(item_id)
            .bind(quantity)
            .bind(&sale.sale_number)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE pos_sales SET status = 'cancelled', updated_at = ?3 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_sale(company_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("POS sale", id))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Next sale number for today, read inside the completing transaction.
    async fn next_sale_number(
        &self,
        tx: &mut SqlxTransaction<'_, Sqlite>,
        company_id: &str,
        date: chrono::NaiveDate,
    ) -> DbResult<String> {
        let prefix = format!("POS-{}", date.format("%Y%m%d"));

        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT sale_number FROM pos_sales \
             WHERE company_id = ?1 AND sale_number LIKE ?2 || '%'",
        )
        .bind(company_id)
        .bind(&prefix)
        .fetch_all(&mut **tx)
        .await?;

        let next = numbers
            .iter()
            .filter_map(|n| numbering::parse_sequence(n))
            .max()
            .unwrap_or(0)
            + 1;

        Ok(numbering::format_document_number("POS", date, next))
    }

    /// Checks and deducts stock for one sale line, writing one movement per
    /// warehouse touched.
    async fn deduct_line(
        &self,
        tx: &mut SqlxTransaction<'_, Sqlite>,
        company_id: &str,
        cashier_id: Option<&str>,
        sale_number: &str,
        line: &PosSaleLineInput,
        now: chrono::DateTime<Utc>,
    ) -> DbResult<()> {
        let sku: String =
            sqlx::query_scalar("SELECT sku FROM items WHERE id = ?1 AND company_id = ?2")
                .bind(&line.item_id)
                .bind(company_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| DbError::not_found("Item", &line.item_id))?;

        let levels: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT s.warehouse_id, s.quantity, s.reserved \
             FROM stocks s INNER JOIN warehouses w ON w.id = s.warehouse_id \
             WHERE w.company_id = ?1 AND w.is_active = 1 AND s.item_id = ?2",
        )
        .bind(company_id)
        .bind(&line.item_id)
        .fetch_all(&mut **tx)
        .await?;

        let levels: Vec<StockLevel> = levels
            .into_iter()
            .map(|(warehouse_id, quantity, reserved)| StockLevel {
                warehouse_id,
                quantity,
                reserved,
            })
            .collect();

        let plan = plan_deduction(&sku, &levels, line.quantity)?;

        for allocation in &plan {
            sqlx::query(
                "UPDATE stocks SET quantity = quantity - ?3, updated_at = ?4 \
                 WHERE warehouse_id = ?1 AND item_id = ?2",
            )
            .bind(&allocation.warehouse_id)
            .bind(&line.item_id)
            .bind(allocation.quantity)
            .bind(now)
            .execute(&mut **tx)
            .await?;

            sqlx::query(
                "INSERT INTO stock_movements (id, company_id, warehouse_id, item_id, \
                 movement_type, quantity, reference_type, reference_number, date, notes, \
                 created_by, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, 'out', ?5, 'pos_sale', ?6, ?7, NULL, ?8, ?7, ?7)",
            )
            .bind(crate::generate_id())
            .bind(company_id)
            .bind(&allocation.warehouse_id)
            .bind(&line.item_id)
            .bind(allocation.quantity)
            .bind(sale_number)
            .bind(now)
            .bind(cashier_id)
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
    use crate::repository::test_support::{seed_company, seed_item, seed_warehouse};
    use keel_core::MovementType;

    fn sale_input(item_id: &str, quantity: i64) -> PosSaleInput {
        PosSaleInput {
            customer_id: None,
            discount_cents: 0,
            tax_cents: 0,
            payment_method: PosPaymentMethod::Cash,
            notes: None,
            lines: vec![PosSaleLineInput {
                item_id: item_id.to_string(),
                quantity,
                unit_price_cents: 1000,
                discount_cents: 0,
            }],
            payments: vec![],
        }
    }

    async fn stock_by_warehouse(db: &Database, company_id: &str) -> Vec<(String, i64)> {
        db.inventory()
            .list_stocks(company_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.warehouse_id, s.quantity))
            .collect()
    }

    #[tokio::test]
    async fn test_complete_sale_deducts_descending_and_logs_movements() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let big = seed_warehouse(&db, &company_id, "BIG").await;
        let small = seed_warehouse(&db, &company_id, "SMALL").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        db.inventory().upsert_stock(&big.id, &item.id, 50, 0).await.unwrap();
        db.inventory().upsert_stock(&small.id, &item.id, 25, 0).await.unwrap();

        let sale = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 70))
            .await
            .unwrap();

        assert_eq!(sale.status, PosSaleStatus::Completed);
        assert_eq!(sale.subtotal_cents, 70_000);
        assert_eq!(sale.total_cents, 70_000);
        assert!(sale.sale_number.starts_with("POS-"));

        // 50 from the bigger warehouse, 20 from the smaller.
        let mut stocks = stock_by_warehouse(&db, &company_id).await;
        stocks.sort();
        let mut expected = vec![(big.id.clone(), 0), (small.id.clone(), 5)];
        expected.sort();
        assert_eq!(stocks, expected);

        // One movement per warehouse touched, carrying the sale number.
        let movements = db.inventory().list_movements(&company_id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements
            .iter()
            .all(|m| m.reference_number.as_deref() == Some(sale.sale_number.as_str())));
        assert!(movements.iter().all(|m| m.movement_type == MovementType::Out));

        // Defaulted payment covers the full total.
        let payments = db.pos().get_sale_payments(&sale.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_cents, 70_000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_whole_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        db.inventory().upsert_stock(&warehouse.id, &item.id, 5, 0).await.unwrap();

        let err = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 10,
                ..
            })
        ));

        // Nothing was written.
        assert!(db.pos().list_sales(&company_id).await.unwrap().is_empty());
        assert!(db.inventory().list_movements(&company_id).await.unwrap().is_empty());
        assert_eq!(stock_by_warehouse(&db, &company_id).await, vec![(warehouse.id, 5)]);
    }

    #[tokio::test]
    async fn test_reserved_stock_blocks_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        // 10 on hand, 8 reserved: only 2 sellable.
        db.inventory().upsert_stock(&warehouse.id, &item.id, 10, 8).await.unwrap();

        let err = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_sale_numbers_increment_within_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        db.inventory().upsert_stock(&warehouse.id, &item.id, 100, 0).await.unwrap();

        let first = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 1))
            .await
            .unwrap();
        let second = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 1))
            .await
            .unwrap();

        let first_seq = numbering::parse_sequence(&first.sale_number).unwrap();
        let second_seq = numbering::parse_sequence(&second.sale_number).unwrap();
        assert_eq!(second_seq, first_seq + 1);
    }

    #[tokio::test]
    async fn test_void_restores_stock_with_linked_movements() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let big = seed_warehouse(&db, &company_id, "BIG").await;
        let small = seed_warehouse(&db, &company_id, "SMALL").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        db.inventory().upsert_stock(&big.id, &item.id, 50, 0).await.unwrap();
        db.inventory().upsert_stock(&small.id, &item.id, 25, 0).await.unwrap();

        let sale = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 70))
            .await
            .unwrap();

        let voided = db.pos().void_sale(&company_id, &sale.id).await.unwrap();
        assert_eq!(voided.status, PosSaleStatus::Cancelled);

        // Stock back where it started.
        let mut stocks = stock_by_warehouse(&db, &company_id).await;
        stocks.sort();
        let mut expected = vec![(big.id, 50), (small.id, 25)];
        expected.sort();
        assert_eq!(stocks, expected);

        // Reversal movements mirror the originals and link back to the sale.
        let movements = db.inventory().list_movements(&company_id).await.unwrap();
        let reversals: Vec<_> = movements
            .iter()
            .filter(|m| m.reference_type.as_deref() == Some("pos_void"))
            .collect();
        assert_eq!(reversals.len(), 2);
        assert!(reversals.iter().all(|m| m.movement_type == MovementType::In));
        assert!(reversals
            .iter()
            .all(|m| m.reference_number.as_deref() == Some(sale.sale_number.as_str())));
    }

    #[tokio::test]
    async fn test_void_twice_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let warehouse = seed_warehouse(&db, &company_id, "MAIN").await;
        let item = seed_item(&db, &company_id, "SKU-1").await;

        db.inventory().upsert_stock(&warehouse.id, &item.id, 10, 0).await.unwrap();

        let sale = db
            .pos()
            .complete_sale(&company_id, None, sale_input(&item.id, 5))
            .await
            .unwrap();
        db.pos().void_sale(&company_id, &sale.id).await.unwrap();

        let err = db.pos().void_sale(&company_id, &sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_sales_invisible_across_companies() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_a = seed_company(&db).await;
        let company_b =
            crate::repository::test_support::seed_company_named(&db, "other", "Other Co").await;
        let warehouse = seed_warehouse(&db, &company_a, "MAIN").await;
        let item = seed_item(&db, &company_a, "SKU-1").await;

        db.inventory().upsert_stock(&warehouse.id, &item.id, 10, 0).await.unwrap();
        let sale = db
            .pos()
            .complete_sale(&company_a, None, sale_input(&item.id, 1))
            .await
            .unwrap();

        assert!(db.pos().get_sale(&company_b, &sale.id).await.unwrap().is_none());
        assert!(db.pos().list_sales(&company_b).await.unwrap().is_empty());
    }
}
