//! # CRM Repository
//!
//! Leads, opportunities, and activities.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{Activity, Lead, Opportunity};

const LEAD_COLUMNS: &str = "id, company_id, name, email, phone, mobile, source, status, \
     assigned_to, notes, created_at, updated_at";

const OPPORTUNITY_COLUMNS: &str = "id, company_id, lead_id, contact_id, title, value_cents, \
     probability, stage, expected_close_date, assigned_to, notes, created_at, updated_at";

const ACTIVITY_COLUMNS: &str = "id, company_id, activity_type, subject, description, \
     due_date, completed, related_kind, related_id, assigned_to, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CrmRepository {
    pool: SqlitePool,
}

impl CrmRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CrmRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Leads
    // -------------------------------------------------------------------------

    pub async fn list_leads(&self, company_id: &str) -> DbResult<Vec<Lead>> {
        let rows = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_lead(&self, company_id: &str, id: &str) -> DbResult<Option<Lead>> {
        let row = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_lead(&self, lead: &Lead) -> DbResult<()> {
        debug!(name = %lead.name, "Inserting lead");

        sqlx::query(&format!(
            "INSERT INTO leads ({LEAD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(&lead.id)
        .bind(&lead.company_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.mobile)
        .bind(lead.source)
        .bind(lead.status)
        .bind(&lead.assigned_to)
        .bind(&lead.notes)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_lead(&self, lead: &Lead) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE leads SET name = ?3, email = ?4, phone = ?5, mobile = ?6, source = ?7, \
             status = ?8, assigned_to = ?9, notes = ?10, updated_at = ?11 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&lead.id)
        .bind(&lead.company_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.mobile)
        .bind(lead.source)
        .bind(lead.status)
        .bind(&lead.assigned_to)
        .bind(&lead.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lead", &lead.id));
        }

        Ok(())
    }

    pub async fn delete_lead(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM leads WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lead", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Opportunities
    // -------------------------------------------------------------------------

    pub async fn list_opportunities(&self, company_id: &str) -> DbResult<Vec<Opportunity>> {
        let rows = sqlx::query_as::<_, Opportunity>(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities \
             WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_opportunity(
        &self,
        company_id: &str,
        id: &str,
    ) -> DbResult<Option<Opportunity>> {
        let row = sqlx::query_as::<_, Opportunity>(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_opportunity(&self, opportunity: &Opportunity) -> DbResult<()> {
        debug!(title = %opportunity.title, "Inserting opportunity");

        sqlx::query(&format!(
            "INSERT INTO opportunities ({OPPORTUNITY_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ))
        .bind(&opportunity.id)
        .bind(&opportunity.company_id)
        .bind(&opportunity.lead_id)
        .bind(&opportunity.contact_id)
        .bind(&opportunity.title)
        .bind(opportunity.value_cents)
        .bind(opportunity.probability)
        .bind(opportunity.stage)
        .bind(opportunity.expected_close_date)
        .bind(&opportunity.assigned_to)
        .bind(&opportunity.notes)
        .bind(opportunity.created_at)
        .bind(opportunity.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_opportunity(&self, opportunity: &Opportunity) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE opportunities SET lead_id = ?3, contact_id = ?4, title = ?5, \
             value_cents = ?6, probability = ?7, stage = ?8, expected_close_date = ?9, \
             assigned_to = ?10, notes = ?11, updated_at = ?12 \
             WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&opportunity.id)
        .bind(&opportunity.company_id)
        .bind(&opportunity.lead_id)
        .bind(&opportunity.contact_id)
        .bind(&opportunity.title)
        .bind(opportunity.value_cents)
        .bind(opportunity.probability)
        .bind(opportunity.stage)
        .bind(opportunity.expected_close_date)
        .bind(&opportunity.assigned_to)
        .bind(&opportunity.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Opportunity", &opportunity.id));
        }

        Ok(())
    }

    pub async fn delete_opportunity(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Opportunity", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Activities
    // -------------------------------------------------------------------------

    pub async fn list_activities(&self, company_id: &str) -> DbResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities \
             WHERE company_id = ?1 ORDER BY due_date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_activity(&self, company_id: &str, id: &str) -> DbResult<Option<Activity>> {
        let row = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_activity(&self, activity: &Activity) -> DbResult<()> {
        sqlx::query(&format!(
            "INSERT INTO activities ({ACTIVITY_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(&activity.id)
        .bind(&activity.company_id)
        .bind(activity.activity_type)
        .bind(&activity.subject)
        .bind(&activity.description)
        .bind(activity.due_date)
        .bind(activity.completed)
        .bind(activity.related_kind)
        .bind(&activity.related_id)
        .bind(&activity.assigned_to)
        .bind(activity.created_at)
        .bind(activity.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_activity(&self, activity: &Activity) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE activities SET activity_type = ?3, subject = ?4, description = ?5, \
             due_date = ?6, completed = ?7, related_kind = ?8, related_id = ?9, \
             assigned_to = ?10, updated_at = ?11 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&activity.id)
        .bind(&activity.company_id)
        .bind(activity.activity_type)
        .bind(&activity.subject)
        .bind(&activity.description)
        .bind(activity.due_date)
        .bind(activity.completed)
        .bind(activity.related_kind)
        .bind(&activity.related_id)
        .bind(&activity.assigned_to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Activity", &activity.id));
        }

        Ok(())
    }

    pub async fn delete_activity(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM activities WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Activity", id));
        }

        Ok(())
    }
}
