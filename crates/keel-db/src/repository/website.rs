//! # Website Repository
//!
//! CMS pages, blog posts, and public contact-form messages.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use keel_core::{BlogPost, Message, Page};

const PAGE_COLUMNS: &str = "id, company_id, title, slug, content, meta_title, \
     meta_description, meta_keywords, is_published, published_date, author_id, created_at, \
     updated_at";

const POST_COLUMNS: &str = "id, company_id, title, slug, excerpt, content, \
     featured_image_url, category, tags, meta_title, meta_description, meta_keywords, \
     is_published, published_date, author_id, views, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct WebsiteRepository {
    pool: SqlitePool,
}

impl WebsiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WebsiteRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Pages
    // -------------------------------------------------------------------------

    pub async fn list_pages(&self, company_id: &str) -> DbResult<Vec<Page>> {
        let rows = sqlx::query_as::<_, Page>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE company_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_page(&self, company_id: &str, id: &str) -> DbResult<Option<Page>> {
        let row = sqlx::query_as::<_, Page>(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_page(&self, page: &Page) -> DbResult<()> {
        debug!(slug = %page.slug, "Inserting page");

        sqlx::query(&format!(
            "INSERT INTO pages ({PAGE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ))
        .bind(&page.id)
        .bind(&page.company_id)
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(&page.meta_keywords)
        .bind(page.is_published)
        .bind(page.published_date)
        .bind(&page.author_id)
        .bind(page.created_at)
        .bind(page.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_page(&self, page: &Page) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE pages SET title = ?3, slug = ?4, content = ?5, meta_title = ?6, \
             meta_description = ?7, meta_keywords = ?8, is_published = ?9, \
             published_date = ?10, updated_at = ?11 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&page.id)
        .bind(&page.company_id)
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(&page.meta_keywords)
        .bind(page.is_published)
        .bind(page.published_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Page", &page.id));
        }

        Ok(())
    }

    pub async fn delete_page(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Page", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Blog posts
    // -------------------------------------------------------------------------

    pub async fn list_posts(&self, company_id: &str) -> DbResult<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts \
             WHERE company_id = ?1 ORDER BY published_date DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_post(&self, company_id: &str, id: &str) -> DbResult<Option<BlogPost>> {
        let row = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?1 AND company_id = ?2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn insert_post(&self, post: &BlogPost) -> DbResult<()> {
        debug!(slug = %post.slug, "Inserting blog post");

        sqlx::query(&format!(
            "INSERT INTO blog_posts ({POST_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18)"
        ))
        .bind(&post.id)
        .bind(&post.company_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image_url)
        .bind(&post.category)
        .bind(&post.tags)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(&post.meta_keywords)
        .bind(post.is_published)
        .bind(post.published_date)
        .bind(&post.author_id)
        .bind(post.views)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_post(&self, post: &BlogPost) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE blog_posts SET title = ?3, slug = ?4, excerpt = ?5, content = ?6, \
             featured_image_url = ?7, category = ?8, tags = ?9, meta_title = ?10, \
             meta_description = ?11, meta_keywords = ?12, is_published = ?13, \
             published_date = ?14, updated_at = ?15 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(&post.id)
        .bind(&post.company_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image_url)
        .bind(&post.category)
        .bind(&post.tags)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(&post.meta_keywords)
        .bind(post.is_published)
        .bind(post.published_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Blog post", &post.id));
        }

        Ok(())
    }

    pub async fn delete_post(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Blog post", id));
        }

        Ok(())
    }

    /// Bumps the view counter on a post read.
    pub async fn increment_post_views(&self, company_id: &str, id: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE blog_posts SET views = views + 1 WHERE id = ?1 AND company_id = ?2",
        )
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------------

    pub async fn list_messages(&self) -> DbResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            "SELECT id, name, email, subject, message, created_at FROM messages \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_message(&self, message: &Message) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO messages (id, name, email, subject, message, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
