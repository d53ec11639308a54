//! # Contact Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::Contact;

const CONTACT_COLUMNS: &str = "id, company_id, name, email, phone, mobile, address, \
     city, postal_code, country, company_name, position, website, contact_type, \
     notes, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    pub async fn list(&self, company_id: &str) -> DbResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts \
             WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    pub async fn get(&self, company_id: &str, id: &str) -> DbResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }

    pub async fn insert(&self, contact: &Contact) -> DbResult<()> {
        debug!(name = %contact.name, "Inserting contact");

        sqlx::query(
            "INSERT INTO contacts (id, company_id, name, email, phone, mobile, address, \
             city, postal_code, country, company_name, position, website, contact_type, \
             notes, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
             ?16, ?17, ?18)",
        )
        .bind(&contact.id)
        .bind(&contact.company_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.mobile)
        .bind(&contact.address)
        .bind(&contact.city)
        .bind(&contact.postal_code)
        .bind(&contact.country)
        .bind(&contact.company_name)
        .bind(&contact.position)
        .bind(&contact.website)
        .bind(contact.contact_type)
        .bind(&contact.notes)
        .bind(contact.is_active)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, contact: &Contact) -> DbResult<()> {
        debug!(id = %contact.id, "Updating contact");

        let result = sqlx::query(
            "UPDATE contacts SET name = ?3, email = ?4, phone = ?5, mobile = ?6, \
             address = ?7, city = ?8, postal_code = ?9, country = ?10, \
             company_name = ?11, position = ?12, website = ?13, contact_type = ?14, \
             notes = ?15, is_active = ?16, updated_at = ?17 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&contact.id)
        .bind(&contact.company_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.mobile)
        .bind(&contact.address)
        .bind(&contact.city)
        .bind(&contact.postal_code)
        .bind(&contact.country)
        .bind(&contact.company_name)
        .bind(&contact.position)
        .bind(&contact.website)
        .bind(contact.contact_type)
        .bind(&contact.notes)
        .bind(contact.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", &contact.id));
        }

        Ok(())
    }

    pub async fn delete(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contact", id));
        }

        Ok(())
    }
}
