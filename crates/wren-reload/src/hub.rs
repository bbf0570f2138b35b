//! Connected browser clients, keyed by the page that opened them.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use crate::message::ReloadMessage;

pub type ClientId = usize;

struct Client {
    page: String,
    tx: mpsc::Sender<String>,
}

/// Registry of reload connections.
///
/// Each client gets its own bounded queue. Sends never wait: a client whose queue is
/// full misses that message, and a client whose receiver is gone is removed.
pub struct ClientHub {
    clients: RwLock<FxHashMap<ClientId, Client>>,
    next_id: AtomicUsize,
    buffer: usize,
}

impl ClientHub {
    /// `buffer` is the per-client queue depth.
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: RwLock::new(FxHashMap::default()),
            next_id: AtomicUsize::new(0),
            buffer: buffer.max(1),
        }
    }

    /// Register a client for `page_url` (normalized with [`normalize_page_url`]).
    pub fn register(&self, page_url: &str) -> (ClientId, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        let page = normalize_page_url(page_url);
        tracing::debug!(client = id, page = %page, "Reload client connected");
        self.clients.write().insert(id, Client { page, tx });
        (id, rx)
    }

    pub fn unregister(&self, id: ClientId) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!(client = id, "Reload client disconnected");
        }
    }

    /// Drop every client. Receivers yield what is already queued, then `None`.
    pub fn disconnect_all(&self) {
        let dropped = {
            let mut clients = self.clients.write();
            let count = clients.len();
            clients.clear();
            count
        };
        if dropped > 0 {
            tracing::debug!(clients = dropped, "Disconnected all reload clients");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Distinct pages with at least one connected client, sorted.
    pub fn pages(&self) -> Vec<String> {
        let mut pages: Vec<String> = self
            .clients
            .read()
            .values()
            .map(|c| c.page.clone())
            .collect();
        pages.sort();
        pages.dedup();
        pages
    }

    /// Send `message` to clients whose page is in `pages`. Returns how many accepted it.
    pub fn send_to_pages(&self, pages: &[String], message: &ReloadMessage) -> usize {
        let wanted: Vec<String> = pages.iter().map(|p| normalize_page_url(p)).collect();
        let targets: Vec<(ClientId, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .filter(|(_, c)| wanted.contains(&c.page))
            .map(|(id, c)| (*id, c.tx.clone()))
            .collect();
        self.deliver(targets, message)
    }

    /// Send `message` to every client. Returns how many accepted it.
    pub fn broadcast(&self, message: &ReloadMessage) -> usize {
        let targets: Vec<(ClientId, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, c)| (*id, c.tx.clone()))
            .collect();
        self.deliver(targets, message)
    }

    fn deliver(
        &self,
        targets: Vec<(ClientId, mpsc::Sender<String>)>,
        message: &ReloadMessage,
    ) -> usize {
        let json = message.to_json();
        let mut delivered = 0;
        let mut failed_ids = Vec::new();

        for (id, tx) in targets {
            match tx.try_send(json.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        client = id,
                        "Reload client is not keeping up, dropping message"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => failed_ids.push(id),
            }
        }

        for id in failed_ids {
            self.unregister(id);
        }
        delivered
    }
}

/// Canonical form of a page URL used to match clients with entry points.
///
/// Accepts full URLs (as sent in `Referer`) or paths. Query and fragment are dropped,
/// a leading `/` is ensured, and a trailing `index.html` is removed so `/demo/`
/// and `/demo/index.html` are the same page.
pub fn normalize_page_url(raw: &str) -> String {
    let path = match url::Url::parse(raw) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let mut path = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };
    if path.ends_with("/index.html") {
        path.truncate(path.len() - "index.html".len());
    }
    path
}
