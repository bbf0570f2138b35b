//! Development server command implementation.
//!
//! Orchestrates the server lifecycle:
//! - Layered configuration with validation
//! - Import map generation
//! - File watching with debouncing
//! - Targeted reloads through the reload orchestrator
//! - HTTP server with the reload socket
//! - Graceful shutdown on Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::signal;
use tokio::sync::oneshot;
use wren_cache::{ModuleScanner, Transform, TransformCache};
use wren_config::{CacheOverrides, ConfigOverrides, ReloadOverrides, ServeConfig, WatchOverrides};
use wren_reload::{ClientHub, Orchestrator, ReloadMessage, ScannedEntryPoints};
use wren_watch::{FileWatcher, IgnoreMatcher, WatchOptions};

use crate::cli::ServeArgs;
use crate::commands::utils;
use crate::dev::{AppState, DevServer};
use crate::error::{CliError, Result};
use crate::ui;

/// How long the server and orchestrator get to finish after Ctrl+C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Execute the serve command.
///
/// # Process Flow
///
/// 1. Load and validate configuration
/// 2. Generate the import map
/// 3. Start the file watcher and hand its batches to the reload orchestrator
/// 4. Start the HTTP server
/// 5. Wait for Ctrl+C, logging cache statistics periodically
/// 6. Tell clients the server is going away, then stop watcher, server and orchestrator
///
/// # Errors
///
/// Returns errors for invalid configuration, import map generation failures,
/// watcher startup failures and server bind failures.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let started = Instant::now();
    ui::info("Starting development server...");

    let project_dir = utils::project_dir(&args.config)?;
    let config = utils::load_config(&project_dir, &args.config, &overrides_for(&args))?;
    ui::info(&format!("Root: {}", config.root.display()));

    let options = utils::generate_options(&config);
    let import_map = utils::initial_import_map(&config, &options)?;
    ui::info(&format!(
        "Import map: {} imports, {} scopes",
        import_map.imports.len(),
        import_map.scopes.len()
    ));
    let import_map = Arc::new(RwLock::new(import_map));

    let cache = Arc::new(TransformCache::new(config.cache.max_size_bytes));
    let transform: Arc<dyn Transform> = Arc::new(ModuleScanner::new());
    let hub = Arc::new(ClientHub::new(config.reload.client_buffer));

    let ignore = config.ignore_patterns();
    let (watcher, events) = FileWatcher::watch(
        &config.root,
        WatchOptions {
            debounce: Duration::from_millis(config.watch.debounce_ms),
            ignore: ignore.clone(),
            ..WatchOptions::default()
        },
    )?;

    let entries = ScannedEntryPoints::new(watcher.root(), IgnoreMatcher::new(ignore.as_slice())?);
    let mut orchestrator = Orchestrator::new(
        watcher.root(),
        Arc::clone(&cache),
        Arc::clone(&hub),
        Arc::clone(&import_map),
        entries,
    )
    .with_transform(Arc::clone(&transform));
    if config.import_map.generate {
        orchestrator = orchestrator.with_import_map_generation(options);
    }
    let orchestrator = orchestrator.spawn(events);

    let addr = resolve_addr(&config).await?;
    let state = AppState::new(
        config.root.clone(),
        Arc::clone(&cache),
        transform,
        import_map,
        Arc::clone(&hub),
    )
    .with_reload(config.reload.enabled);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = DevServer::new(addr, state);
    let mut server_handle = tokio::spawn(server.start(async move {
        let _ = shutdown_rx.await;
    }));

    ui::success(&format!(
        "Ready at {} in {}",
        config.server_url(),
        ui::format_duration(started.elapsed())
    ));
    ui::info(&format!(
        "Cache capacity {}, debounce {}ms, live reload {}",
        ui::format_size(config.cache.max_size_bytes),
        config.watch.debounce_ms,
        if config.reload.enabled { "on" } else { "off" }
    ));
    ui::info("Press Ctrl+C to stop");

    let stats_enabled = config.cache.stats_interval_secs > 0;
    let mut stats = tokio::time::interval(Duration::from_secs(
        config.cache.stats_interval_secs.max(1),
    ));
    // The first tick completes immediately.
    stats.tick().await;

    let server_exit = loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break None;
            }
            result = &mut server_handle => break Some(result),
            _ = stats.tick(), if stats_enabled => log_cache_stats(&cache),
        }
    };

    let notified = hub.broadcast(&ReloadMessage::shutdown());
    tracing::debug!(clients = notified, "Sent shutdown notice");
    hub.disconnect_all();
    watcher.close();
    let _ = shutdown_tx.send(());

    let server_exit = match server_exit {
        Some(result) => Some(result),
        None => match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_handle).await {
            Ok(result) => Some(result),
            Err(_) => {
                tracing::warn!("Server did not stop in time, aborting connections");
                server_handle.abort();
                None
            }
        },
    };

    if tokio::time::timeout(SHUTDOWN_GRACE, orchestrator).await.is_err() {
        tracing::warn!("Reload orchestrator did not stop in time");
    }

    match server_exit {
        Some(Ok(Err(e))) => return Err(e),
        Some(Err(e)) => return Err(CliError::Server(format!("server task failed: {}", e))),
        Some(Ok(Ok(()))) | None => {}
    }

    ui::success("Development server stopped");
    Ok(())
}

/// Configuration layer built from `serve` flags.
fn overrides_for(args: &ServeArgs) -> ConfigOverrides {
    let mut overrides = utils::config_overrides(&args.config);
    overrides.host = args.host.clone();
    overrides.port = args.port;
    overrides.watch = WatchOverrides {
        debounce_ms: args.debounce_ms,
        ignore: args.ignore.clone(),
    };
    overrides.cache = CacheOverrides {
        max_size_bytes: args.cache_size,
    };
    if args.no_import_map {
        overrides.import_map.generate = Some(false);
    }
    if args.no_reload {
        overrides.reload = ReloadOverrides {
            enabled: Some(false),
        };
    }
    overrides
}

async fn resolve_addr(config: &ServeConfig) -> Result<SocketAddr> {
    let address = config.address();
    let mut candidates = tokio::net::lookup_host(address.as_str())
        .await
        .map_err(|e| CliError::InvalidArgument(format!("cannot resolve {}: {}", address, e)))?;
    candidates
        .next()
        .ok_or_else(|| CliError::InvalidArgument(format!("no address found for {}", address)))
}

fn log_cache_stats(cache: &TransformCache) {
    let stats = cache.stats();
    tracing::debug!(
        entries = stats.entries,
        hit_rate = %format!("{:.1}%", stats.hit_rate),
        used = %format!("{:.1} MB", stats.size_mb()),
        max = %format!("{:.1} MB", stats.max_size_mb()),
        "Transform cache statistics"
    );
}
