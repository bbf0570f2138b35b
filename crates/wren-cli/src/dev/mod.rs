//! Development server.
//!
//! - Files served from the root, modules through the transform cache
//! - Import map and reload client injected into HTML pages
//! - Reload notifications over a WebSocket per page

pub mod files;
pub mod server;
pub mod socket;
pub mod state;

pub use server::{DevServer, build_router};
pub use state::AppState;

/// Reload WebSocket endpoint.
pub const RELOAD_SOCKET_PATH: &str = "/__wren/reload";

/// Browser side of live reload.
pub const RELOAD_SCRIPT_PATH: &str = "/__wren/reload.js";

/// The current import map as JSON.
pub const IMPORT_MAP_PATH: &str = "/__wren/importmap.json";
