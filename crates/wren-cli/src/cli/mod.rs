//! Command-line interface definition.
//!
//! - `wren serve [ROOT]` - serve and watch a directory with targeted live reload
//! - `wren importmap [ROOT]` - print the import map generated for a directory

mod commands;
mod tests;
mod validation;

use clap::Parser;

pub use commands::{Command, ConfigArgs, ImportmapArgs, ServeArgs};
pub use validation::parse_import_override;

/// wren - a live-reloading dev server for web component libraries
#[derive(Parser, Debug)]
#[command(
    name = "wren",
    version,
    about = "A live-reloading dev server for web component libraries",
    long_about = "wren serves a component library's demo pages with a generated import map,\n\
                  caches transformed modules in memory and reloads only the pages affected\n\
                  by each change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
