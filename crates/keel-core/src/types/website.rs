//! Website: CMS pages, blog posts, and contact-form messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CMS page. Slug is unique per company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Page {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BlogPost {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image_url: Option<String>,
    pub category: Option<String>,
    /// Comma-separated tag list.
    pub tags: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A public contact-form submission. Not company-scoped; created without
/// authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Message {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
