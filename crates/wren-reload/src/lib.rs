//! Smart reload for the wren dev server.
//!
//! The [`Orchestrator`] consumes debounced watcher batches. For each batch it drops
//! the affected transform cache entries, works out which HTML entry points import
//! the invalidated modules (through the shared import map where specifiers are
//! bare), and notifies only the browser clients showing those pages.
//!
//! Batches are processed strictly one after another, so invalidation for a batch is
//! complete before its impact analysis starts.

mod entry;
mod error;
mod hub;
mod impact;
mod message;
mod orchestrator;

pub use entry::{EntryPoint, EntryPointSource, ScannedEntryPoints, extract_module_imports};
pub use error::{ReloadError, Result};
pub use hub::{ClientHub, ClientId, normalize_page_url};
pub use impact::{import_candidates, is_affected};
pub use message::{FILE_CHANGE, ReloadMessage};
pub use orchestrator::{
    BatchReport, BatchStage, Manifest, ManifestSource, Orchestrator, SharedImportMap,
};
