//! Admin API endpoints (admin session required)
//!
//! - GET /api/admin/posts - All posts including drafts
//! - POST /api/admin/posts - Create a post
//! - PATCH /api/admin/posts/{id}/status - Publish or unpublish
//! - GET /api/admin/contacts - Contact submissions
//! - GET /api/admin/subscribers - Newsletter subscribers

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{BlogPost, Contact, CreateBlogPostInput, NewsletterSubscriber, UpdateStatusInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}/status", patch(update_post_status))
        .route("/contacts", get(list_contacts))
        .route("/subscribers", get(list_subscribers))
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.blog_service.list_all().await?))
}

async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<CreateBlogPostInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::validation_error(e.body_text()))?;
    let post = state.blog_service.create(input, &user.username).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusInput>, JsonRejection>,
) -> Result<Json<BlogPost>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::not_found("Blog post not found"))?;
    let Json(input) = payload.map_err(|e| ApiError::validation_error(e.body_text()))?;
    Ok(Json(state.blog_service.update_status(id, &input.status).await?))
}

async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .storage
        .get_contacts()
        .await
        .context("Failed to list contacts")?;
    Ok(Json(contacts))
}

async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsletterSubscriber>>, ApiError> {
    let subscribers = state
        .storage
        .get_newsletters()
        .await
        .context("Failed to list subscribers")?;
    Ok(Json(subscribers))
}
