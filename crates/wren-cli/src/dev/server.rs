//! The development HTTP server.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::files::handle_request;
use super::socket::handle_reload_socket;
use super::{AppState, IMPORT_MAP_PATH, RELOAD_SCRIPT_PATH, RELOAD_SOCKET_PATH};
use crate::error::{CliError, Result};

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

pub struct DevServer {
    addr: SocketAddr,
    state: AppState,
}

impl DevServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Server`] if the address cannot be bound or the server fails.
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = self.addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route(IMPORT_MAP_PATH, get(handle_import_map));
    if state.reload {
        router = router
            .route(RELOAD_SOCKET_PATH, get(handle_reload_socket))
            .route(RELOAD_SCRIPT_PATH, get(handle_reload_script));
    }

    router
        .route("/favicon.ico", get(handle_favicon))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_import_map(State(state): State<AppState>) -> impl IntoResponse {
    let json = state.import_map.read().to_json_pretty();
    (
        [
            (header::CONTENT_TYPE, "application/importmap+json"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        json,
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

/// Serve `favicon.ico` from the root when present, 204 otherwise.
async fn handle_favicon(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::fs::read(state.root.join("favicon.ico")).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/x-icon")], bytes).into_response(),
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}
