//! GET /sitemap.xml

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::api::middleware::{ApiError, AppState};

pub async fn sitemap_xml(State(state): State<AppState>) -> Result<Response, ApiError> {
    let xml = state
        .sitemap
        .render(&state.content, Utc::now().date_naive())?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        xml,
    )
        .into_response())
}
