//! Accounting: chart of accounts, journal entries, and their transaction
//! lines.
//!
//! The balance invariant (sum of debits equals sum of credits per entry)
//! lives in [`crate::ledger`]; these are the persisted shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Chart of Accounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// A ledger account. Accounts form a tree via `parent_id`; `code` is the
/// human-facing identifier, unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: String,
    pub company_id: String,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Journal Entry
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
    Cancelled,
}

impl Default for EntryStatus {
    fn default() -> Self {
        EntryStatus::Draft
    }
}

/// A journal entry header. Its lines are [`Transaction`] rows; creating or
/// updating an entry always writes header and lines in one database
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct JournalEntry {
    pub id: String,
    pub company_id: String,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: EntryStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a journal entry: a debit or a credit against an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub journal_entry_id: String,
    pub account_id: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AccountType::Liability).unwrap(),
            "\"liability\""
        );
    }

    #[test]
    fn test_entry_status_default_is_draft() {
        assert_eq!(EntryStatus::default(), EntryStatus::Draft);
    }
}
