//! Serving files from the root directory.
//!
//! Modules the transform handles go through the transform cache; HTML pages get
//! the current import map and, when live reload is on, the reload client.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use wren_cache::{TransformError, load, normalize_module_path};

use super::{AppState, RELOAD_SCRIPT_PATH};

/// Handle every request not claimed by a `/__wren/` route.
pub async fn handle_request(State(state): State<AppState>, uri: Uri) -> Response {
    if let Some(location) = directory_redirect(&state.root, &uri) {
        return Redirect::permanent(&location).into_response();
    }

    let Some(path) = resolve_request(&state.root, uri.path()) else {
        return not_found(uri.path());
    };

    if state.transform.handles(&path) {
        return serve_module(&state, path).await;
    }

    let file = state.root.join(&path);
    if is_html(&path) {
        return match tokio::fs::read_to_string(&file).await {
            Ok(html) => {
                let html = prepare_html(&state, &html);
                respond(content_type(&path), html.into_bytes())
            }
            Err(e) => read_failed(&path, e),
        };
    }

    match tokio::fs::read(&file).await {
        Ok(bytes) => respond(content_type(&path), bytes),
        Err(e) => read_failed(&path, e),
    }
}

/// Where to send a directory request that lacks its trailing slash.
///
/// Pages must be loaded as `/dir/` so relative imports resolve inside `dir` and the
/// reload client registers under the same URL as the page's entry point.
pub fn directory_redirect(root: &Path, uri: &Uri) -> Option<String> {
    let request_path = uri.path();
    if request_path.ends_with('/') || request_path.split('/').any(|segment| segment == "..") {
        return None;
    }
    let path = normalize_module_path(request_path);
    if path.is_empty() || !root.join(&path).is_dir() {
        return None;
    }
    Some(match uri.query() {
        Some(query) => format!("/{}/?{}", path, query),
        None => format!("/{}/", path),
    })
}

/// Module path to serve for a request path, or `None` when it escapes the root.
///
/// Directories (and paths ending in `/`) serve their `index.html`.
pub fn resolve_request(root: &Path, request_path: &str) -> Option<String> {
    if request_path.split('/').any(|segment| segment == "..") {
        return None;
    }
    let path = normalize_module_path(request_path);
    if path.is_empty() {
        return Some("index.html".to_string());
    }
    if request_path.ends_with('/') || root.join(&path).is_dir() {
        return Some(format!("{}/index.html", path));
    }
    Some(path)
}

async fn serve_module(state: &AppState, path: String) -> Response {
    let cache = Arc::clone(&state.cache);
    let transform = Arc::clone(&state.transform);
    let root = Arc::clone(&state.root);
    let module = path.clone();

    let result =
        tokio::task::spawn_blocking(move || load(&cache, transform.as_ref(), &root, &module))
            .await;

    match result {
        Ok(Ok(entry)) => respond(content_type(&path), entry.output.clone()),
        Ok(Err(TransformError::Io { source, .. })) => read_failed(&path, source),
        Ok(Err(e)) => {
            tracing::error!(file = %path, "Transform failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(file = %path, "Transform task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Inject the import map, then the reload client.
pub fn prepare_html(state: &AppState, html: &str) -> String {
    let html = state.import_map.read().inject_html(html);
    if state.reload {
        inject_reload_script(&html)
    } else {
        html
    }
}

/// Add the reload client before `</body>`, or at the end without one.
pub fn inject_reload_script(html: &str) -> String {
    let script_tag = format!(r#"<script type="module" src="{}"></script>"#, RELOAD_SCRIPT_PATH);
    if html.contains(&script_tag) {
        return html.to_string();
    }

    let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
    match html.rfind("</body>") {
        Some(pos) => {
            result.push_str(&html[..pos]);
            result.push_str("  ");
            result.push_str(&script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
        }
        None => {
            result.push_str(html);
            result.push('\n');
            result.push_str(&script_tag);
        }
    }
    result
}

fn is_html(path: &str) -> bool {
    path.ends_with(".html") || path.ends_with(".htm")
}

pub fn content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" | "ts" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" | "md" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn respond(content_type: &'static str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from(body),
    )
        .into_response()
}

fn read_failed(path: &str, e: std::io::Error) -> Response {
    if matches!(
        e.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
    ) {
        return not_found(path);
    }
    tracing::warn!(file = %path, "Failed to read file: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response()
}
