//! Public blog endpoints
//!
//! - GET /api/blogs - Published posts
//! - GET /api/blogs/{id} - One published post

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::BlogPost;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{id}", get(get_published))
}

async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.blog_service.list_published().await?))
}

/// Non-numeric ids and drafts are reported as missing
async fn get_published(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::not_found("Blog post not found"))?;
    Ok(Json(state.blog_service.get_published(id).await?))
}
