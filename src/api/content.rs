//! Read-only site content
//!
//! - GET /api/posts - Markdown post summaries
//! - GET /api/posts/{slug} - One markdown post with rendered HTML
//! - GET /api/ventures - Venture catalogue
//! - GET /api/ventures/{slug} - One venture

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::content::{Post, PostSummary};
use crate::services::ventures::{self, Venture};

pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(get_post))
}

pub fn ventures_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ventures))
        .route("/{slug}", get(get_venture))
}

async fn list_posts(State(state): State<AppState>) -> Json<Vec<PostSummary>> {
    Json(state.content.summaries())
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    state
        .content
        .get(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Post not found"))
}

async fn list_ventures() -> Json<&'static [Venture]> {
    Json(ventures::all())
}

async fn get_venture(Path(slug): Path<String>) -> Result<Json<&'static Venture>, ApiError> {
    ventures::find(&slug)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Venture not found"))
}
