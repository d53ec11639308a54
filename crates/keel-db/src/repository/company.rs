//! # Company Repository
//!
//! Companies and company memberships - the tenancy backbone.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{Company, CompanyMembership, CompanyRole};

const COMPANY_COLUMNS: &str = "id, owner_id, name, address, phone, tax_id, \
     registration_number, is_active, created_at, updated_at";

const MEMBERSHIP_COLUMNS: &str =
    "id, user_id, company_id, role, is_active, permissions, joined_at";

#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Companies
    // -------------------------------------------------------------------------

    /// Companies created by this user, newest first.
    pub async fn list_owned(&self, owner_id: &str) -> DbResult<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies \
             WHERE owner_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    pub async fn count_owned(&self, owner_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM companies WHERE owner_id = ?1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Retrieval scoped to the owner, for the company detail endpoints.
    pub async fn get_owned(&self, owner_id: &str, id: &str) -> DbResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Inserts a company and its owner membership in one transaction.
    pub async fn insert(&self, company: &Company) -> DbResult<()> {
        debug!(name = %company.name, "Inserting company");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO companies (id, owner_id, name, address, phone, tax_id, \
             registration_number, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&company.id)
        .bind(&company.owner_id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.tax_id)
        .bind(&company.registration_number)
        .bind(company.is_active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO company_memberships (id, user_id, company_id, role, is_active, \
             permissions, joined_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(crate::generate_id())
        .bind(&company.owner_id)
        .bind(&company.id)
        .bind(CompanyRole::Owner)
        .bind(true)
        .bind(Option::<serde_json::Value>::None)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update(&self, company: &Company) -> DbResult<()> {
        debug!(id = %company.id, "Updating company");

        let result = sqlx::query(
            "UPDATE companies SET name = ?3, address = ?4, phone = ?5, tax_id = ?6, \
             registration_number = ?7, is_active = ?8, updated_at = ?9 \
             WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(&company.id)
        .bind(&company.owner_id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.tax_id)
        .bind(&company.registration_number)
        .bind(company.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", &company.id));
        }

        Ok(())
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Memberships
    // -------------------------------------------------------------------------

    /// All active memberships for a user, newest first.
    pub async fn list_memberships(&self, user_id: &str) -> DbResult<Vec<CompanyMembership>> {
        let memberships = sqlx::query_as::<_, CompanyMembership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM company_memberships \
             WHERE user_id = ?1 AND is_active = 1 ORDER BY joined_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    /// Whether the user is an active member of the company. Gates the
    /// active-company switch.
    pub async fn is_member(&self, user_id: &str, company_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM company_memberships \
             WHERE user_id = ?1 AND company_id = ?2 AND is_active = 1",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn insert_membership(&self, membership: &CompanyMembership) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO company_memberships (id, user_id, company_id, role, is_active, \
             permissions, joined_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&membership.id)
        .bind(&membership.user_id)
        .bind(&membership.company_id)
        .bind(membership.role)
        .bind(membership.is_active)
        .bind(&membership.permissions)
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await?;

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
    use keel_core::User;

    async fn seeded_db() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let user = User {
            id: crate::generate_id(),
            username: "owner".to_string(),
            email: None,
            full_name: None,
            password_hash: "hash".to_string(),
            active_company_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();
        (db, user.id)
    }

    fn company(owner_id: &str, name: &str) -> Company {
        let now = Utc::now();
        Company {
            id: crate::generate_id(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            address: None,
            phone: None,
            tax_id: None,
            registration_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_creates_owner_membership() {
        let (db, owner_id) = seeded_db().await;
        let repo = db.companies();

        let c = company(&owner_id, "Acme");
        repo.insert(&c).await.unwrap();

        assert!(repo.is_member(&owner_id, &c.id).await.unwrap());
        let memberships = repo.list_memberships(&owner_id).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].role, CompanyRole::Owner);
    }

    #[tokio::test]
    async fn test_owned_scoping() {
        let (db, owner_id) = seeded_db().await;
        let repo = db.companies();

        let c = company(&owner_id, "Acme");
        repo.insert(&c).await.unwrap();

        assert!(repo.get_owned(&owner_id, &c.id).await.unwrap().is_some());
        assert!(repo.get_owned("someone-else", &c.id).await.unwrap().is_none());
        assert_eq!(repo.count_owned(&owner_id).await.unwrap(), 1);
    }
}
