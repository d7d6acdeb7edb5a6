//! API layer - HTTP handlers and routing
//!
//! - Lead capture (contact, newsletter)
//! - Public blog and markdown content
//! - Venture catalogue
//! - Admin auth and CMS endpoints
//! - Sitemap and the SEO-aware SPA fallback

pub mod admin;
pub mod auth;
pub mod blogs;
pub mod content;
pub mod leads;
pub mod middleware;
pub mod sitemap;
pub mod static_files;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser, ClientIp, ClientIpSource};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (any signed-in user)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(leads::router())
        .nest("/auth", auth::public_router())
        .nest("/blogs", blogs::router())
        .nest("/posts", content::posts_router())
        .nest("/ventures", content::ventures_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

fn cors_layer(cors_origin: &str) -> Result<CorsLayer> {
    // Credentials rule out a literal wildcard, so "*" echoes the caller
    let origin = if cors_origin == "*" {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::exact(
            cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?,
        )
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router> {
    Ok(Router::new()
        .nest("/api", build_api_router(state.clone()))
        .route("/sitemap.xml", get(sitemap::sitemap_xml))
        .fallback(static_files::serve_static)
        .layer(CompressionLayer::new())
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
