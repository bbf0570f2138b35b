//! Recursive file watching with debounced, batched change events.
//!
//! The native watcher feeds raw changes into a debounce task. Once no new change has
//! arrived for the configured window, everything collected so far is emitted as one
//! [`FileEvent`] on a bounded channel. When the consumer falls behind, the newest
//! batch is dropped and logged rather than blocking the watcher.

mod debounce;
mod error;
mod event;
mod ignore;
mod watcher;

pub use error::{Result, WatchError};
pub use event::{ChangeKind, FileEvent};
pub use ignore::IgnoreMatcher;
pub use watcher::{FileWatcher, WatchOptions};
