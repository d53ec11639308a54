//! # keel-db: Database Layer for Keel ERP
//!
//! SQLite persistence for every ERP module, via sqlx.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per ERP module
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keel_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./keel.db")).await?;
//!
//! let items = db.inventory().list_items(&company_id).await?;
//! let sale = db.pos().complete_sale(&company_id, Some(&user_id), input).await?;
//! ```
//!
//! ## Company Scoping
//!
//! Every repository method that touches company-owned data takes the owning
//! `company_id` and folds it into the WHERE clause. There is no way to read
//! or write across tenants from this crate's public API.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::accounting::{AccountingRepository, EntryLineInput, JournalEntryInput};
pub use repository::pos::{PosRepository, PosSaleInput, PosSaleLineInput, PosTenderInput};

/// Generates a new UUID v4 entity id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
