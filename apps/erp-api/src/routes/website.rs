//! Website: CMS pages, blog posts, and the public contact form.
//!
//! Reading a blog post bumps its view counter. The contact-form endpoint is
//! the one unauthenticated write in the API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::{AuthUser, CompanyScope};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use keel_core::validation::{validate_name, validate_slug};
use keel_core::{BlogPost, Message, Page};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/:id", get(get_page).put(update_page).delete(delete_page))
        .route("/blog-posts", get(list_posts).post(create_post))
        .route(
            "/blog-posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/messages", get(list_messages).post(create_message))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct PagePayload {
    title: String,
    slug: String,
    content: String,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    #[serde(default)]
    is_published: bool,
    published_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BlogPostPayload {
    title: String,
    slug: String,
    excerpt: Option<String>,
    content: String,
    featured_image_url: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    #[serde(default)]
    is_published: bool,
    published_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    name: String,
    email: String,
    subject: String,
    message: String,
}

// =============================================================================
// Pages
// =============================================================================

async fn list_pages(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Page>>> {
    Ok(Json(state.db.website().list_pages(&scope.company_id).await?))
}

async fn create_page(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<PagePayload>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    validate_name("title", &payload.title)?;
    validate_slug(&payload.slug)?;

    let now = Utc::now();
    let page = Page {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        title: payload.title.trim().to_string(),
        slug: payload.slug.trim().to_string(),
        content: payload.content,
        meta_title: payload.meta_title,
        meta_description: payload.meta_description,
        meta_keywords: payload.meta_keywords,
        is_published: payload.is_published,
        published_date: payload.published_date,
        author_id: Some(scope.user.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state.db.website().insert_page(&page).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn get_page(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Page>> {
    let page = state
        .db
        .website()
        .get_page(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {id}")))?;

    Ok(Json(page))
}

async fn update_page(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PagePayload>,
) -> ApiResult<Json<Page>> {
    validate_name("title", &payload.title)?;
    validate_slug(&payload.slug)?;

    let mut page = state
        .db
        .website()
        .get_page(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {id}")))?;

    page.title = payload.title.trim().to_string();
    page.slug = payload.slug.trim().to_string();
    page.content = payload.content;
    page.meta_title = payload.meta_title;
    page.meta_description = payload.meta_description;
    page.meta_keywords = payload.meta_keywords;
    page.is_published = payload.is_published;
    page.published_date = payload.published_date;

    state.db.website().update_page(&page).await?;
    Ok(Json(page))
}

async fn delete_page(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.website().delete_page(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Blog posts
// =============================================================================

async fn list_posts(
    scope: CompanyScope,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BlogPost>>> {
    Ok(Json(state.db.website().list_posts(&scope.company_id).await?))
}

async fn create_post(
    scope: CompanyScope,
    State(state): State<AppState>,
    Json(payload): Json<BlogPostPayload>,
) -> ApiResult<(StatusCode, Json<BlogPost>)> {
    validate_name("title", &payload.title)?;
    validate_slug(&payload.slug)?;

    let now = Utc::now();
    let post = BlogPost {
        id: keel_db::generate_id(),
        company_id: scope.company_id.clone(),
        title: payload.title.trim().to_string(),
        slug: payload.slug.trim().to_string(),
        excerpt: payload.excerpt,
        content: payload.content,
        featured_image_url: payload.featured_image_url,
        category: payload.category,
        tags: payload.tags,
        meta_title: payload.meta_title,
        meta_description: payload.meta_description,
        meta_keywords: payload.meta_keywords,
        is_published: payload.is_published,
        published_date: payload.published_date,
        author_id: Some(scope.user.id.clone()),
        views: 0,
        created_at: now,
        updated_at: now,
    };

    state.db.website().insert_post(&post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlogPost>> {
    let post = state
        .db
        .website()
        .get_post(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blog post not found: {id}")))?;

    state
        .db
        .website()
        .increment_post_views(&scope.company_id, &id)
        .await?;

    Ok(Json(post))
}

async fn update_post(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BlogPostPayload>,
) -> ApiResult<Json<BlogPost>> {
    validate_name("title", &payload.title)?;
    validate_slug(&payload.slug)?;

    let mut post = state
        .db
        .website()
        .get_post(&scope.company_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blog post not found: {id}")))?;

    post.title = payload.title.trim().to_string();
    post.slug = payload.slug.trim().to_string();
    post.excerpt = payload.excerpt;
    post.content = payload.content;
    post.featured_image_url = payload.featured_image_url;
    post.category = payload.category;
    post.tags = payload.tags;
    post.meta_title = payload.meta_title;
    post.meta_description = payload.meta_description;
    post.meta_keywords = payload.meta_keywords;
    post.is_published = payload.is_published;
    post.published_date = payload.published_date;

    state.db.website().update_post(&post).await?;
    Ok(Json(post))
}

async fn delete_post(
    scope: CompanyScope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.website().delete_post(&scope.company_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Messages
// =============================================================================

/// Reading messages requires auth (any logged-in user); submitting one does
/// not, since it backs the public contact form.
async fn list_messages(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.db.website().list_messages().await?))
}

async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<MessagePayload>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    validate_name("name", &payload.name)?;
    validate_name("subject", &payload.subject)?;
    if payload.message.trim().is_empty() {
        return Err(ApiError::Validation("message is required".to_string()));
    }

    let message = Message {
        id: keel_db::generate_id(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        subject: payload.subject.trim().to_string(),
        message: payload.message,
        created_at: Utc::now(),
    };

    state.db.website().insert_message(&message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
