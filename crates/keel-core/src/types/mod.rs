//! # Domain Types
//!
//! The relational records for every ERP module, one file per module.
//!
//! ## Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every record:                                                          │
//! │    id           - UUID v4 string, immutable, used for relations        │
//! │    created_at / updated_at - UTC timestamps                            │
//! │                                                                         │
//! │  Every company-owned record:                                           │
//! │    company_id   - owning tenant; all queries filter on it              │
//! │    business key - human-facing unique-per-company id (sku, code,       │
//! │                   document number, slug) where the module has one      │
//! │                                                                         │
//! │  Money is integer cents (i64); quantities are whole units (i64).       │
//! │  Status enums serialize as snake_case strings and map to TEXT          │
//! │  columns via the feature-gated sqlx::Type derive.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod accounting;
pub mod company;
pub mod contact;
pub mod crm;
pub mod delivery;
pub mod ecommerce;
pub mod hr;
pub mod inventory;
pub mod pos;
pub mod procurement;
pub mod sales;
pub mod website;

pub use accounting::*;
pub use company::*;
pub use contact::*;
pub use crm::*;
pub use delivery::*;
pub use ecommerce::*;
pub use hr::*;
pub use inventory::*;
pub use pos::*;
pub use procurement::*;
pub use sales::*;
pub use website::*;
