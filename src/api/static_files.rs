//! Static file serving with SEO injection
//!
//! Files that exist under the static directory are served as-is. Every other
//! path falls back to `index.html` with the page's SEO tags injected so
//! crawlers see per-route metadata.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::api::middleware::{ApiError, AppState};
use crate::services::seo::{inject_head, page_meta};

/// Fallback handler for everything the API router does not match
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let decoded = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let path = decoded.as_ref();

    if path == "/api" || path.starts_with("/api/") {
        return ApiError::not_found("Not found").into_response();
    }

    let Some(relative) = safe_relative_path(path) else {
        return not_found();
    };

    if !relative.as_os_str().is_empty() {
        let file_path = state.static_dir.join(&relative);
        if fs::metadata(&file_path).await.is_ok_and(|m| m.is_file()) {
            return match fs::read(&file_path).await {
                Ok(contents) => build_response(path, contents),
                Err(e) => {
                    tracing::error!("Failed to read {}: {}", file_path.display(), e);
                    not_found()
                }
            };
        }
    }

    serve_index(&state, path).await
}

/// SPA fallback: `index.html` with route-specific head tags
async fn serve_index(state: &AppState, path: &str) -> Response {
    let index_path = state.static_dir.join("index.html");
    let html = match fs::read_to_string(&index_path).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("No client bundle at {}: {}", index_path.display(), e);
            return not_found();
        }
    };

    let meta = page_meta(path, &state.content, &state.site);
    let body = match state.seo.render(&meta) {
        Ok(tags) => inject_head(&html, &tags),
        Err(e) => {
            tracing::error!("Failed to render SEO tags for {}: {:#}", path, e);
            html
        }
    };

    build_response("index.html", body.into_bytes())
}

/// Normalized path below the static root, or `None` when the request tries
/// to leave it
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    let content_type = get_content_type(path);
    let cache_control = if is_immutable(path) {
        "public, max-age=31536000, immutable"
    } else if content_type.starts_with("text/html") {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body><h1>404 Not Found</h1></body></html>",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Vite emits content-hashed bundles under /assets/
fn is_immutable(path: &str) -> bool {
    path.contains("/assets/") && (path.ends_with(".js") || path.ends_with(".css"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path("/assets/app.js"),
            Some(PathBuf::from("assets/app.js"))
        );
        assert_eq!(safe_relative_path("/"), Some(PathBuf::new()));
        assert_eq!(safe_relative_path("/./robots.txt"), Some(PathBuf::from("robots.txt")));
        assert_eq!(safe_relative_path("/../etc/passwd"), None);
        assert_eq!(safe_relative_path("/assets/../../secret"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("/assets/index-abc.js"), "application/javascript");
        assert_eq!(get_content_type("/favicon.ico"), "image/x-icon");
        assert_eq!(get_content_type("/noext"), "application/octet-stream");
    }

    #[test]
    fn test_immutable_assets() {
        assert!(is_immutable("/assets/index-abc123.js"));
        assert!(!is_immutable("/index.html"));
        assert!(!is_immutable("/assets/logo.png"));
    }
}
