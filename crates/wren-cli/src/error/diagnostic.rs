//! Conversion from CLI errors to miette reports.

use crate::error::CliError;
use miette::Report;
use wren_config::ConfigError;

/// Convert a [`CliError`] into a report with a help line where one is useful.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(ConfigError::RootNotFound(path)) => miette::miette!(
            help = "Pass an existing directory as ROOT or set `root` in wren.toml",
            "Root directory not found: {}",
            path.display()
        ),
        CliError::Config(ConfigError::OverrideFileNotFound(path)) => miette::miette!(
            help = "Create the file or remove `import_map.override_file` from your config",
            "Import map override file not found: {}",
            path.display()
        ),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Server(msg) => miette::miette!(
            help = "Is another server already using this port? Try --port",
            "Server error: {}",
            msg
        ),
        other => miette::miette!("{}", other),
    }
}
