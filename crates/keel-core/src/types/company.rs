//! Users, companies, and company memberships.
//!
//! The tenant model: a [`User`] owns at most one [`Company`] and can be a
//! member of several through [`CompanyMembership`]. The user's
//! `active_company_id` selects which tenant scope every data request runs
//! under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// An authenticated user of the system.
///
/// Output-only: users are created through the register endpoint and never
/// deserialized from request bodies, so this derives `Serialize` only and
/// keeps the password hash out of every response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Argon2 hash; never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The tenant scope applied to this user's data requests.
    pub active_company_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Company
// =============================================================================

/// A tenant. Nearly every other record in the schema hangs off one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: String,
    /// The user who created the company; a user creates at most one.
    pub owner_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub registration_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Company Membership
// =============================================================================

/// Role a member holds within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CompanyRole {
    Owner,
    Admin,
    Manager,
    Accountant,
    Employee,
    Viewer,
}

impl Default for CompanyRole {
    fn default() -> Self {
        CompanyRole::Employee
    }
}

/// Links a user to a company with a role. Unique per (user, company).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CompanyMembership {
    pub id: String,
    pub user_id: String,
    pub company_id: String,
    pub role: CompanyRole,
    pub is_active: bool,
    /// Custom per-membership permission grants (free-form JSON).
    pub permissions: Option<serde_json::Value>,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CompanyRole::Accountant).unwrap(),
            "\"accountant\""
        );
    }

    #[test]
    fn test_role_default() {
        assert_eq!(CompanyRole::default(), CompanyRole::Employee);
    }
}
