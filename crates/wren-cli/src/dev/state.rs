//! State shared by every request handler.

use std::path::PathBuf;
use std::sync::Arc;

use wren_cache::{Transform, TransformCache};
use wren_reload::{ClientHub, SharedImportMap};

/// Cheap to clone; everything behind it is shared.
#[derive(Clone)]
pub struct AppState {
    /// Canonical directory being served.
    pub root: Arc<PathBuf>,
    pub cache: Arc<TransformCache>,
    pub transform: Arc<dyn Transform>,
    pub import_map: SharedImportMap,
    pub hub: Arc<ClientHub>,
    /// Inject the reload client into HTML and accept reload sockets.
    pub reload: bool,
}

impl AppState {
    pub fn new(
        root: PathBuf,
        cache: Arc<TransformCache>,
        transform: Arc<dyn Transform>,
        import_map: SharedImportMap,
        hub: Arc<ClientHub>,
    ) -> Self {
        Self {
            root: Arc::new(root),
            cache,
            transform,
            import_map,
            hub,
            reload: true,
        }
    }

    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }
}
