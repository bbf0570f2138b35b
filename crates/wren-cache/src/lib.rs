//! Transform cache for the wren dev server.
//!
//! Compiled output is stored per file snapshot (`path`, modification time, size) so an
//! edited file naturally misses. Each entry records the module paths it depends on; the
//! reverse index built from those lists lets [`TransformCache::invalidate`] drop every
//! entry that transitively depends on a changed file.
//!
//! # Architecture
//!
//! - **Explicit instance**: callers construct a [`TransformCache`] and share it by `Arc`
//! - **Single lock**: entries, recency order and the reverse index change together
//! - **Bounded**: total output size never exceeds the configured capacity (LRU eviction)
//!
//! Module paths are root-relative and `/`-separated without a leading slash
//! (`src/button.ts`); see [`module_path`].

mod error;
mod key;
mod path;
mod scan;
mod stats;
mod store;
mod transform;

pub use error::{Result, TransformError};
pub use key::CacheKey;
pub use path::{module_path, normalize_module_path};
pub use scan::{ModuleScanner, import_specifiers};
pub use stats::CacheStats;
pub use store::{CacheEntry, TransformCache};
pub use transform::{Transform, TransformOutput, load};
