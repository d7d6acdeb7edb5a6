//! API middleware
//!
//! Contains:
//! - shared application state
//! - the JSON error type every handler returns
//! - authentication (session token) and admin authorization
//! - client IP extraction for rate limiting and verification

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{DeploymentProfile, SiteConfig};
use crate::models::{FieldError, User};
use crate::services::{
    BlogService, BlogServiceError, ContentLibrary, LeadError, LeadService, SeoRenderer,
    SitemapGenerator, UserService, UserServiceError,
};
use crate::storage::DynStorage;

/// Session cookie lifetime in seconds (7 days)
pub const SESSION_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub user_service: Arc<UserService>,
    pub blog_service: Arc<BlogService>,
    pub lead_service: Arc<LeadService>,
    pub content: Arc<ContentLibrary>,
    pub seo: Arc<SeoRenderer>,
    pub sitemap: Arc<SitemapGenerator>,
    pub site: Arc<SiteConfig>,
    /// Built client bundle served by the SPA fallback
    pub static_dir: Arc<PathBuf>,
    pub client_ip_source: ClientIpSource,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// Which request data identifies the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientIpSource {
    /// Socket peer only. Proxy headers are client-controlled.
    #[default]
    Peer,
    /// `X-Forwarded-For` / `X-Real-IP` set by a trusted reverse proxy
    Forwarded,
    /// `CF-Connecting-IP` set by the Cloudflare edge
    Cloudflare,
}

impl ClientIpSource {
    pub fn from_config(profile: DeploymentProfile, trust_forwarded_headers: bool) -> Self {
        match profile {
            DeploymentProfile::Edge => Self::Cloudflare,
            DeploymentProfile::Server if trust_forwarded_headers => Self::Forwarded,
            DeploymentProfile::Server => Self::Peer,
        }
    }
}

/// Client address used as the lead rate-limit key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientIp(client_ip(&parts.headers, peer, state.client_ip_source)))
    }
}

/// Resolve the client address for `source`, falling back to the peer
/// address and then `"unknown"`
pub fn client_ip(headers: &HeaderMap, peer: Option<String>, source: ClientIpSource) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let from_headers = match source {
        ClientIpSource::Peer => None,
        ClientIpSource::Cloudflare => header_value("cf-connecting-ip"),
        ClientIpSource::Forwarded => header_value("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| header_value("x-real-ip")),
    };

    from_headers
        .map(str::to_string)
        .or(peer)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Validation failure listing every rejected field
    pub fn invalid_fields(message: impl Into<String>, errors: &[FieldError]) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            message,
            serde_json::json!({ "errors": errors }),
        )
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMIT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" | "ALREADY_SUBSCRIBED" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Internal details are logged, never sent to the client
fn internal(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Request failed: {}", e);
    ApiError::internal_error("Internal server error")
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        internal(format!("{:#}", e))
    }
}

impl From<LeadError> for ApiError {
    fn from(e: LeadError) -> Self {
        match e {
            LeadError::RateLimited => ApiError::rate_limited(e.to_string()),
            LeadError::Validation { message, errors } => ApiError::invalid_fields(message, &errors),
            LeadError::VerificationFailed | LeadError::TokenRequired => {
                ApiError::forbidden(e.to_string())
            }
            LeadError::AlreadySubscribed => ApiError::new("ALREADY_SUBSCRIBED", e.to_string()),
            LeadError::Internal(e) => internal(format!("{:#}", e)),
        }
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(e: BlogServiceError) -> Self {
        match e {
            BlogServiceError::Validation(errors) => {
                ApiError::invalid_fields("Invalid blog post data", &errors)
            }
            BlogServiceError::NotFound => ApiError::not_found("Blog post not found"),
            BlogServiceError::SlugConflict(slug) => ApiError::with_details(
                "CONFLICT",
                format!("A post with slug '{}' already exists", slug),
                serde_json::json!({ "field": "slug", "value": slug }),
            ),
            BlogServiceError::InvalidStatus(_) => ApiError::validation_error(e.to_string()),
            BlogServiceError::InternalError(e) => internal(format!("{:#}", e)),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::InvalidCredentials => ApiError::unauthorized(e.to_string()),
            UserServiceError::RateLimited => ApiError::with_details(
                "RATE_LIMIT",
                e.to_string(),
                serde_json::json!({ "retry_after": 900 }),
            ),
            UserServiceError::Validation(errors) => {
                ApiError::invalid_fields("Invalid user data", &errors)
            }
            UserServiceError::UserExists(_) => ApiError::conflict(e.to_string()),
            UserServiceError::InternalError(e) => internal(format!("{:#}", e)),
        }
    }
}

/// Extract session token from request: bearer header first, then cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .find_map(|c| c.trim().strip_prefix("session="))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware, layered inside [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Not authorized"));
    }

    Ok(next.run(request).await)
}
