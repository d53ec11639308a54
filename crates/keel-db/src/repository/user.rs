//! # User Repository
//!
//! User records and the active-company pointer that scopes every data
//! request.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::User;

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, \
     active_company_id, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Login lookup; the caller verifies the password hash.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(username = %user.username, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, password_hash, \
             active_company_id, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.active_company_id)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Points the user at a new active company (or clears it with `None`).
    /// Membership is checked by the caller before this runs.
    pub async fn set_active_company(&self, user_id: &str, company_id: Option<&str>) -> DbResult<()> {
        debug!(user_id = %user_id, company_id = ?company_id, "Switching active company");

        let result = sqlx::query(
            "UPDATE users SET active_company_id = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
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

    fn user(username: &str) -> User {
        let now = Utc::now();
        User {
            id: crate::generate_id(),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            full_name: None,
            password_hash: "argon2-hash".to_string(),
            active_company_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let u = user("alice");
        repo.insert(&u).await.unwrap();

        let found = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, u.id);
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&user("bob")).await.unwrap();
        let err = repo.insert(&user("bob")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
