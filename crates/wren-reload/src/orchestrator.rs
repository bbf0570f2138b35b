//! The per-batch pipeline: invalidate, analyze impact, notify.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wren_cache::{Transform, TransformCache, load, module_path, normalize_module_path};
use wren_importmap::{GenerateOptions, ImportMap, generate};
use wren_watch::FileEvent;

use crate::entry::EntryPointSource;
use crate::hub::ClientHub;
use crate::impact::is_affected;
use crate::message::ReloadMessage;

/// The import map shared between the orchestrator and request handlers.
pub type SharedImportMap = Arc<RwLock<ImportMap>>;

/// Extensions whose changes go through cache invalidation.
const RELEVANT_EXTENSIONS: &[&str] = &["ts", "js", "mjs", "css", "html"];

/// Output of the manifest collaborator.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Opaque metadata blob; not interpreted here.
    pub bytes: Vec<u8>,
    /// Module paths the manifest was built from.
    pub touched: Vec<String>,
}

pub trait ManifestSource: Send + Sync {
    fn manifest(&self) -> Option<Manifest>;
}

/// Stages a batch moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Received,
    CacheInvalidated,
    ImpactAnalyzed,
    Dispatched,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStage::Received => "received",
            BatchStage::CacheInvalidated => "cache-invalidated",
            BatchStage::ImpactAnalyzed => "impact-analyzed",
            BatchStage::Dispatched => "dispatched",
        };
        f.write_str(name)
    }
}

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Changed module paths, root-relative.
    pub changed: Vec<String>,
    /// Every path dropped from the cache (changed paths included), sorted.
    pub invalidated: Vec<String>,
    /// URLs of affected entry points, sorted.
    pub affected_pages: Vec<String>,
    /// Clients that accepted a message for this batch.
    pub delivered: usize,
    /// Files that failed the compile check.
    pub failed: Vec<String>,
    pub import_map_regenerated: bool,
}

/// Consumes watcher batches one at a time and turns them into client notifications.
pub struct Orchestrator {
    root: PathBuf,
    cache: Arc<TransformCache>,
    hub: Arc<ClientHub>,
    import_map: SharedImportMap,
    entries: Box<dyn EntryPointSource>,
    regenerate: Option<GenerateOptions>,
    transform: Option<Arc<dyn Transform>>,
    manifest: Option<Arc<dyn ManifestSource>>,
    /// Paths treated as source-relevant regardless of extension.
    source_paths: FxHashSet<String>,
}

impl Orchestrator {
    pub fn new(
        root: impl Into<PathBuf>,
        cache: Arc<TransformCache>,
        hub: Arc<ClientHub>,
        import_map: SharedImportMap,
        entries: impl EntryPointSource + 'static,
    ) -> Self {
        let root = root.into();
        // Watcher paths are canonical.
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            cache,
            hub,
            import_map,
            entries: Box::new(entries),
            regenerate: None,
            transform: None,
            manifest: None,
            source_paths: FxHashSet::default(),
        }
    }

    /// Regenerate the import map after batches that change package structure.
    pub fn with_import_map_generation(mut self, options: GenerateOptions) -> Self {
        self.regenerate = Some(options);
        self
    }

    /// Recompile changed files through the cache and report failures to clients.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Seed source-relevant paths from the manifest, now and after structural changes.
    pub fn with_manifest(mut self, source: Arc<dyn ManifestSource>) -> Self {
        self.manifest = Some(source);
        self.seed_from_manifest();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run on a blocking thread until the watcher's channel closes.
    pub fn spawn(mut self, mut events: mpsc::Receiver<FileEvent>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            while let Some(event) = events.blocking_recv() {
                self.process_batch(event);
            }
            tracing::debug!("Reload orchestrator stopped");
        })
    }

    /// Handle one batch end to end.
    pub fn process_batch(&mut self, event: FileEvent) -> BatchReport {
        let mut report = BatchReport::default();

        // Received
        report.changed = event
            .paths
            .iter()
            .filter_map(|path| module_path(&self.root, path))
            .filter(|path| !path.is_empty())
            .collect();
        self.stage(BatchStage::Received, &report);
        if report.changed.is_empty() {
            return report;
        }

        if event.changes_structure() {
            report.import_map_regenerated = self.regenerate_import_map();
            self.seed_from_manifest();
        }

        // CacheInvalidated
        let mut invalidated: FxHashSet<String> = FxHashSet::default();
        for path in report.changed.iter().filter(|p| self.is_relevant(p)) {
            invalidated.insert(path.clone());
            invalidated.extend(self.cache.invalidate(path));
        }
        let mut sorted: Vec<String> = invalidated.iter().cloned().collect();
        sorted.sort();
        report.invalidated = sorted;
        self.stage(BatchStage::CacheInvalidated, &report);
        if invalidated.is_empty() {
            return report;
        }

        let errors = self.compile_check(&report.changed);
        report.failed = errors.iter().map(|(file, _)| file.clone()).collect();

        // ImpactAnalyzed
        report.affected_pages = self.affected_pages(&invalidated);
        self.stage(BatchStage::ImpactAnalyzed, &report);

        // Dispatched
        if !errors.is_empty() {
            for (file, message) in errors {
                report.delivered += self
                    .hub
                    .broadcast(&ReloadMessage::compile_error(file, message));
            }
        } else if !report.affected_pages.is_empty() {
            let message = ReloadMessage::file_change(report.changed.clone());
            report.delivered = self.hub.send_to_pages(&report.affected_pages, &message);
        }
        self.stage(BatchStage::Dispatched, &report);

        tracing::info!(
            changed = report.changed.len(),
            invalidated = report.invalidated.len(),
            pages = report.affected_pages.len(),
            clients = report.delivered,
            "Processed file changes"
        );
        report
    }

    fn stage(&self, stage: BatchStage, report: &BatchReport) {
        tracing::debug!(
            stage = %stage,
            changed = report.changed.len(),
            invalidated = report.invalidated.len(),
            affected = report.affected_pages.len(),
            "Reload batch"
        );
    }

    fn is_relevant(&self, path: &str) -> bool {
        if self.source_paths.contains(path) {
            return true;
        }
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| RELEVANT_EXTENSIONS.contains(&ext))
    }

    fn regenerate_import_map(&self) -> bool {
        let Some(options) = &self.regenerate else {
            return false;
        };
        match generate(&self.root, options) {
            Ok(map) => {
                *self.import_map.write() = map;
                tracing::info!("Regenerated import map after package changes");
                true
            }
            Err(e) => {
                tracing::warn!("Import map regeneration failed, keeping previous map: {}", e);
                false
            }
        }
    }

    fn seed_from_manifest(&mut self) {
        let Some(source) = &self.manifest else {
            return;
        };
        if let Some(manifest) = source.manifest() {
            tracing::debug!(
                bytes = manifest.bytes.len(),
                paths = manifest.touched.len(),
                "Seeding source paths from manifest"
            );
            self.source_paths
                .extend(manifest.touched.iter().map(|p| normalize_module_path(p)));
        }
    }

    /// Compile each changed, still-present file; returns `(file, message)` per failure.
    fn compile_check(&self, changed: &[String]) -> Vec<(String, String)> {
        let Some(transform) = &self.transform else {
            return Vec::new();
        };
        let mut errors = Vec::new();
        for path in changed {
            if !transform.handles(path) || !self.root.join(path).is_file() {
                continue;
            }
            if let Err(e) = load(&self.cache, transform.as_ref(), &self.root, path) {
                tracing::error!(file = %path, "Compilation failed: {}", e);
                errors.push((path.clone(), e.to_string()));
            }
        }
        errors
    }

    fn affected_pages(&self, invalidated: &FxHashSet<String>) -> Vec<String> {
        let import_map = self.import_map.read().clone();
        let mut pages: Vec<String> = Vec::new();

        for entry in self.entries.entry_points() {
            let imports = match entry.imports(&self.root) {
                Ok(imports) => imports,
                Err(e) => {
                    tracing::warn!("Excluding entry point from reload analysis: {}", e);
                    continue;
                }
            };
            if !is_affected(&entry, &imports, &import_map, invalidated) {
                continue;
            }
            tracing::debug!(page = %entry.url, file = %entry.file, "Entry point affected");
            if !pages.contains(&entry.url) {
                pages.push(entry.url);
            }
        }

        pages.sort();
        pages
    }
}
