//! Lead capture endpoints
//!
//! - POST /api/contact
//! - POST /api/newsletter

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, ClientIp};
use crate::models::{ContactSubmission, NewsletterSubmission};
use crate::services::LeadOutcome;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/newsletter", post(subscribe))
}

/// Body of a non-persisted success
#[derive(Debug, Serialize)]
pub struct LeadAck {
    pub success: bool,
    pub message: &'static str,
}

impl<T: Serialize> IntoResponse for LeadOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            LeadOutcome::Stored(record) => (StatusCode::CREATED, Json(record)).into_response(),
            LeadOutcome::Accepted { message } | LeadOutcome::Discarded { message } => (
                StatusCode::OK,
                Json(LeadAck {
                    success: true,
                    message,
                }),
            )
                .into_response(),
        }
    }
}

/// Malformed JSON is a validation failure like any other bad input
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation_error(rejection.body_text()))
}

async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let submission = body(payload)?;
    let outcome = state.lead_service.submit_contact(submission, &ip).await?;
    Ok(outcome.into_response())
}

async fn subscribe(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<NewsletterSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let submission = body(payload)?;
    let outcome = state.lead_service.subscribe(submission, &ip).await?;
    Ok(outcome.into_response())
}
