//! Command implementations.
//!
//! - [`serve`] - dev server with watcher, reload orchestrator and HTTP server
//! - [`importmap`] - print the generated import map

pub mod importmap;
pub mod serve;
pub(crate) mod utils;

pub use importmap::execute as importmap_execute;
pub use serve::execute as serve_execute;
