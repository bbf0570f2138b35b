use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::parse_import_override;

/// Available wren subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a directory with live reload
    ///
    /// Watches ROOT, serves its files with the import map injected into every
    /// HTML page and notifies only the pages affected by each change.
    Serve(ServeArgs),

    /// Print the generated import map as JSON
    ///
    /// Runs the same generation as `serve` (package.json, workspaces,
    /// node_modules, override file, --import flags) and writes the result to
    /// stdout.
    Importmap(ImportmapArgs),
}

/// Options shared by every command that reads configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Project directory (defaults to the current directory)
    ///
    /// Configuration is discovered here (`wren.toml`, or the `wren` field of
    /// package.json) and a relative `root` setting is resolved against it.
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Path to a config file, instead of discovery
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file with `imports` and `scopes` merged over the generated map
    #[arg(long = "import-map", value_name = "FILE")]
    pub import_map_override: Option<PathBuf>,

    /// Import map entry applied last, as SPECIFIER=PATH (repeatable)
    ///
    /// Examples:
    ///   --import lit=/vendor/lit.js
    ///   --import @org/ui/=/packages/ui/src/
    #[arg(long = "import", value_name = "SPECIFIER=PATH", value_parser = parse_import_override)]
    pub imports: Vec<(String, String)>,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on (default 8000)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Quiet period after the last change before a batch is processed
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Extra names or glob patterns to ignore when watching (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Upper bound on cached transform output, in bytes
    #[arg(long, value_name = "BYTES")]
    pub cache_size: Option<u64>,

    /// Skip import map generation (override file and --import entries still apply)
    #[arg(long)]
    pub no_import_map: bool,

    /// Serve without live reload
    #[arg(long)]
    pub no_reload: bool,
}

/// Arguments for the importmap command
#[derive(Args, Debug)]
pub struct ImportmapArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print on one line instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}
