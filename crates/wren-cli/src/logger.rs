//! Logging setup for the wren CLI.
//!
//! Library crates only emit `tracing` events; this is the one place a subscriber
//! is installed.
//!
//! # Verbosity
//!
//! 1. `--verbose`: DEBUG for the wren crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`, when set
//! 4. INFO for the wren crates otherwise

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str =
    "wren=debug,wren_cli=debug,wren_cache=debug,wren_config=debug,wren_importmap=debug,\
     wren_reload=debug,wren_watch=debug";

const QUIET_FILTER: &str = "error";

const DEFAULT_FILTER: &str =
    "wren=info,wren_cli=info,wren_cache=info,wren_config=info,wren_importmap=info,\
     wren_reload=info,wren_watch=info";

/// Install the global subscriber. Call once, before anything logs.
///
/// `verbose` wins over `quiet`; `no_color` disables ANSI escapes.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = filter_for(verbose, quiet);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Whether colored output should be used.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise stderr must be
/// a color-capable terminal.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
