//! # Repository Module
//!
//! One repository per ERP module, each a thin `Clone` struct over the pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route handler                                                          │
//! │       │  db.inventory().list_items(&company_id)                         │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                    │
//! │  ├── list_items / get_item / insert_item / update_item / delete_item   │
//! │  └── ... (warehouses, stocks, movements)                                │
//! │       │  SQL, scoped by company_id                                      │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Plain CRUD methods follow one shape across all repositories:
//! list is ordered the way the module's UI lists records, get/update/delete
//! filter by company and report `NotFound` when zero rows match. The
//! workflow methods (journal entries, POS completion) run multi-statement
//! transactions and are documented on their repositories.

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
pub mod user;
pub mod website;

#[cfg(test)]
pub(crate) mod test_support;
