//! wren CLI - development server for web component libraries.
//!
//! Parses arguments, sets up logging and dispatches to the requested command.

use clap::Parser;
use miette::Result;
use wren_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args).await,
        cli::Command::Importmap(importmap_args) => {
            commands::importmap_execute(importmap_args).await
        }
    };

    result.map_err(error::cli_error_to_miette)
}
