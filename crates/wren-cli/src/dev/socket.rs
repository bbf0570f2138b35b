//! The reload WebSocket.
//!
//! Each connection registers with the [`ClientHub`] under the page it was opened
//! from and forwards hub messages as text frames until either side goes away.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Uri, header};
use axum::response::Response;
use serde::Deserialize;
use wren_reload::{ClientHub, normalize_page_url};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    /// Page the client script is running in.
    pub page: Option<String>,
}

pub async fn handle_reload_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok());
    let page = page_for(params.page.as_deref(), referer, uri.path());
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| client_session(socket, hub, page))
}

/// Page a connection belongs to: `?page=`, then the `Referer` path, then the
/// request path.
pub fn page_for(query: Option<&str>, referer: Option<&str>, request_path: &str) -> String {
    if let Some(page) = query.filter(|p| !p.is_empty()) {
        return normalize_page_url(page);
    }
    if let Some(referer) = referer.filter(|r| !r.is_empty()) {
        return normalize_page_url(referer);
    }
    tracing::warn!(
        path = %request_path,
        "Reload client sent no page, using the request path"
    );
    normalize_page_url(request_path)
}

async fn client_session(mut socket: WebSocket, hub: Arc<ClientHub>, page: String) {
    let (id, mut outgoing) = hub.register(&page);

    loop {
        tokio::select! {
            message = outgoing.recv() => match message {
                Some(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                // Hub dropped us (server shutdown).
                None => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.unregister(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_page_wins() {
        assert_eq!(
            page_for(
                Some("/demos/card/index.html"),
                Some("http://localhost:8000/other/"),
                "/__wren/reload"
            ),
            "/demos/card/"
        );
    }

    #[test]
    fn referer_is_the_fallback() {
        assert_eq!(
            page_for(None, Some("http://localhost:8000/demos/card/?x=1"), "/__wren/reload"),
            "/demos/card/"
        );
        assert_eq!(
            page_for(Some(""), Some("http://localhost:8000/"), "/__wren/reload"),
            "/"
        );
    }

    #[test]
    fn request_path_is_the_last_resort() {
        assert_eq!(page_for(None, None, "/__wren/reload"), "/__wren/reload");
    }
}
