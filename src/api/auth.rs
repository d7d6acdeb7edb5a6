//! Authentication API endpoints
//!
//! - POST /api/auth/login - Admin login
//! - POST /api/auth/logout - Logout
//! - GET /api/auth/me - Current user

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{
    extract_session_token, ApiError, AppState, AuthenticatedUser, SESSION_COOKIE_MAX_AGE,
};
use crate::models::User;
use crate::services::LoginInput;

const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, SESSION_COOKIE_MAX_AGE
    ))
    .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.user_service.login(body).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&session.id)?);

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    state.user_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(CLEAR_SESSION_COOKIE),
    );
    Ok((StatusCode::NO_CONTENT, response_headers))
}

async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
