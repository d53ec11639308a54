//! # Accounting Repository
//!
//! Chart of accounts CRUD plus the journal-entry workflow.
//!
//! ## Journal Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CREATE                                                                 │
//! │    validate_balanced(lines)  ← keel-core, before any write             │
//! │    BEGIN                                                                │
//! │      INSERT journal_entries                                             │
//! │      INSERT transactions (one per line)                                 │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  UPDATE                                                                 │
//! │    validate_balanced(replacement lines)                                 │
//! │    BEGIN                                                                │
//! │      UPDATE journal_entries                                             │
//! │      DELETE transactions WHERE journal_entry_id = ?                     │
//! │      INSERT replacement transactions                                    │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::ledger::{self, EntryLine};
use keel_core::{Account, EntryStatus, JournalEntry, Transaction};

const ACCOUNT_COLUMNS: &str =
    "id, company_id, code, name, account_type, parent_id, is_active, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, company_id, entry_number, date, description, reference, \
     status, created_by, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, journal_entry_id, account_id, debit_cents, \
     credit_cents, description, created_at, updated_at";

// =============================================================================
// Inputs
// =============================================================================

/// One submitted journal entry line.
#[derive(Debug, Clone)]
pub struct EntryLineInput {
    pub account_id: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub description: Option<String>,
}

/// A journal entry as submitted for create or update.
#[derive(Debug, Clone)]
pub struct JournalEntryInput {
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: EntryStatus,
    pub lines: Vec<EntryLineInput>,
}

fn to_ledger_lines(lines: &[EntryLineInput]) -> Vec<EntryLine> {
    lines
        .iter()
        .map(|l| EntryLine {
            account_id: l.account_id.clone(),
            debit_cents: l.debit_cents,
            credit_cents: l.credit_cents,
        })
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct AccountingRepository {
    pool: SqlitePool,
}

impl AccountingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountingRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Chart of accounts
    // -------------------------------------------------------------------------

    pub async fn list_accounts(&self, company_id: &str) -> DbResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE company_id = ?1 ORDER BY code"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn get_account(&self, company_id: &str, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn insert_account(&self, account: &Account) -> DbResult<()> {
        debug!(code = %account.code, "Inserting account");

        sqlx::query(
            "INSERT INTO accounts (id, company_id, code, name, account_type, parent_id, \
             is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&account.id)
        .bind(&account.company_id)
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type)
        .bind(&account.parent_id)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_account(&self, account: &Account) -> DbResult<()> {
        debug!(id = %account.id, "Updating account");

        let result = sqlx::query(
            "UPDATE accounts SET code = ?3, name = ?4, account_type = ?5, parent_id = ?6, \
             is_active = ?7, updated_at = ?8 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&account.id)
        .bind(&account.company_id)
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type)
        .bind(&account.parent_id)
        .bind(account.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", &account.id));
        }

        Ok(())
    }

    pub async fn delete_account(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Journal entries
    // -------------------------------------------------------------------------

    pub async fn list_entries(&self, company_id: &str) -> DbResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries \
             WHERE company_id = ?1 ORDER BY date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn get_entry(&self, company_id: &str, id: &str) -> DbResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lines of one entry, in insertion order.
    pub async fn get_entry_lines(&self, entry_id: &str) -> DbResult<Vec<Transaction>> {
        let lines = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE journal_entry_id = ?1 ORDER BY created_at, id"
        ))
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Creates a journal entry with its lines in one transaction.
    ///
    /// The balance invariant is validated before anything is written; an
    /// unbalanced submission never reaches the database.
    pub async fn create_entry(
        &self,
        company_id: &str,
        created_by: Option<&str>,
        input: JournalEntryInput,
    ) -> DbResult<JournalEntry> {
        ledger::validate_balanced(&to_ledger_lines(&input.lines))?;

        let now = Utc::now();
        let entry = JournalEntry {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            entry_number: input.entry_number,
            date: input.date,
            description: input.description,
            reference: input.reference,
            status: input.status,
            created_by: created_by.map(String::from),
            created_at: now,
            updated_at: now,
        };

        debug!(entry_number = %entry.entry_number, lines = input.lines.len(), "Creating journal entry");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO journal_entries (id, company_id, entry_number, date, description, \
             reference, status, created_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&entry.id)
        .bind(&entry.company_id)
        .bind(&entry.entry_number)
        .bind(entry.date)
        .bind(&entry.description)
        .bind(&entry.reference)
        .bind(entry.status)
        .bind(&entry.created_by)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &input.lines {
            sqlx::query(
                "INSERT INTO transactions (id, journal_entry_id, account_id, debit_cents, \
                 credit_cents, description, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(crate::generate_id())
            .bind(&entry.id)
            .bind(&line.account_id)
            .bind(line.debit_cents)
            .bind(line.credit_cents)
            .bind(&line.description)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entry)
    }

    /// Updates a journal entry, replacing all of its lines transactionally.
    pub async fn update_entry(
        &self,
        company_id: &str,
        id: &str,
        input: JournalEntryInput,
    ) -> DbResult<JournalEntry> {
        ledger::validate_balanced(&to_ledger_lines(&input.lines))?;

        let now = Utc::now();

        debug!(id = %id, lines = input.lines.len(), "Replacing journal entry lines");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE journal_entries SET entry_number = ?3, date = ?4, description = ?5, \
             reference = ?6, status = ?7, updated_at = ?8 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .bind(&input.entry_number)
        .bind(input.date)
        .bind(&input.description)
        .bind(&input.reference)
        .bind(input.status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Journal entry", id));
        }

        sqlx::query("DELETE FROM transactions WHERE journal_entry_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for line in &input.lines {
            sqlx::query(
                "INSERT INTO transactions (id, journal_entry_id, account_id, debit_cents, \
                 credit_cents, description, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(crate::generate_id())
            .bind(id)
            .bind(&line.account_id)
            .bind(line.debit_cents)
            .bind(line.credit_cents)
            .bind(&line.description)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_entry(company_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Journal entry", id))
    }

    /// Deletes an entry; its lines go with it (ON DELETE CASCADE).
    pub async fn delete_entry(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM journal_entries WHERE id = ?1 AND company_id = ?2")
                .bind(id)
                .bind(company_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Journal entry", id));
        }

        Ok(())
    }

    /// Highest sequence already allocated for entry numbers on a date.
    pub async fn max_entry_sequence(&self, company_id: &str, prefix: &str) -> DbResult<i64> {
        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT entry_number FROM journal_entries \
             WHERE company_id = ?1 AND entry_number LIKE ?2 || '%'",
        )
        .bind(company_id)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers
            .iter()
            .filter_map(|n| keel_core::numbering::parse_sequence(n))
            .max()
            .unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::seed_company;
    use crate::pool::{Database, DbConfig};
    use keel_core::AccountType;

    async fn seed_account(db: &Database, company_id: &str, code: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: crate::generate_id(),
            company_id: company_id.to_string(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            parent_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.accounting().insert_account(&account).await.unwrap();
        account
    }

    fn entry_input(cash: &Account, rent: &Account, amount: i64) -> JournalEntryInput {
        JournalEntryInput {
            entry_number: "JE-20260807-0001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            description: "Office rent".to_string(),
            reference: None,
            status: EntryStatus::Posted,
            lines: vec![
                EntryLineInput {
                    account_id: rent.id.clone(),
                    debit_cents: amount,
                    credit_cents: 0,
                    description: None,
                },
                EntryLineInput {
                    account_id: cash.id.clone(),
                    debit_cents: 0,
                    credit_cents: amount,
                    description: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_balanced_entry_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let cash = seed_account(&db, &company_id, "1000").await;
        let rent = seed_account(&db, &company_id, "6200").await;

        let entry = db
            .accounting()
            .create_entry(&company_id, None, entry_input(&cash, &rent, 120_000))
            .await
            .unwrap();

        let lines = db.accounting().get_entry_lines(&entry.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.iter().map(|l| l.debit_cents).sum::<i64>(), 120_000);
        assert_eq!(lines.iter().map(|l| l.credit_cents).sum::<i64>(), 120_000);
    }

    #[tokio::test]
    async fn test_unbalanced_entry_rejected_before_write() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let cash = seed_account(&db, &company_id, "1000").await;
        let rent = seed_account(&db, &company_id, "6200").await;

        let mut input = entry_input(&cash, &rent, 120_000);
        input.lines[1].credit_cents = 115_000;

        let err = db
            .accounting()
            .create_entry(&company_id, None, input)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(keel_core::CoreError::UnbalancedEntry { .. })
        ));
        assert!(db.accounting().list_entries(&company_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_all_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let cash = seed_account(&db, &company_id, "1000").await;
        let rent = seed_account(&db, &company_id, "6200").await;

        let entry = db
            .accounting()
            .create_entry(&company_id, None, entry_input(&cash, &rent, 120_000))
            .await
            .unwrap();

        let mut replacement = entry_input(&cash, &rent, 90_000);
        replacement.entry_number = entry.entry_number.clone();
        db.accounting()
            .update_entry(&company_id, &entry.id, replacement)
            .await
            .unwrap();

        let lines = db.accounting().get_entry_lines(&entry.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.iter().map(|l| l.debit_cents).sum::<i64>(), 90_000);
    }

    #[tokio::test]
    async fn test_duplicate_entry_number_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let company_id = seed_company(&db).await;
        let cash = seed_account(&db, &company_id, "1000").await;
        let rent = seed_account(&db, &company_id, "6200").await;

        db.accounting()
            .create_entry(&company_id, None, entry_input(&cash, &rent, 100))
            .await
            .unwrap();
        let err = db
            .accounting()
            .create_entry(&company_id, None, entry_input(&cash, &rent, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
