//! wren CLI - live-reloading development server for web component libraries.
//!
//! This crate wires the engine crates into the `wren` binary:
//!
//! - [`error`] - CLI error type, context helpers and miette conversion
//! - [`logger`] - `tracing` subscriber setup
//! - [`ui`] - terminal status lines and formatting
//! - `commands` - `serve` and `importmap`
//! - `dev` - the axum server: file serving, HTML injection, reload socket
//!
//! # Example
//!
//! ```rust,no_run
//! use wren_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
