//! # Keel ERP API
//!
//! Company-scoped REST API for every ERP module.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request                                                                │
//! │    │  Authorization: Bearer <access token>                              │
//! │    ▼                                                                    │
//! │  AuthUser extractor      ← validates the JWT, loads the user           │
//! │    ▼                                                                    │
//! │  CompanyScope extractor  ← resolves the user's active company;         │
//! │                            400 when none is selected                   │
//! │    ▼                                                                    │
//! │  Handler → repository (every query filtered by the active company)     │
//! │    ▼                                                                    │
//! │  Json response / ApiError (400/401/403/404/409)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! Routes are nested under `/api/<module>`: auth, companies, contacts,
//! accounting, inventory, sales, procurement, pos, hr, crm, delivery,
//! ecommerce, website.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use keel_db::Database;
use std::sync::Arc;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<auth::JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = auth::JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}
