//! # keel-core: Pure Business Logic for Keel ERP
//!
//! This crate is the heart of Keel. It contains every business rule as pure
//! functions and plain data types, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Keel Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/erp-api (axum REST)                       │   │
//! │  │    /api/accounting  /api/inventory  /api/pos  /api/sales  ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ keel-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │   stock   │  │   │
//! │  │   │  records  │  │   cents   │  │  balance  │  │ allocation│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  keel-db (Database Layer)                       │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records for every ERP module (companies, accounting,
//!   inventory, sales, procurement, pos, hr, crm, delivery, ecommerce,
//!   website)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Double-entry balance validation for journal entries
//! - [`stock`] - Multi-warehouse stock availability and deduction planning
//! - [`totals`] - Line-item document totals arithmetic
//! - [`numbering`] - Date-prefixed document number generation
//! - [`validation`] - Field-level input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output - always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single document (journal entry, sale,
/// order, invoice). Keeps runaway payloads out of the transaction path.
pub const MAX_DOCUMENT_LINES: usize = 200;

/// Maximum quantity of a single item on one document line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;
