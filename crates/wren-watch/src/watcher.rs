//! Native watcher setup and lifecycle.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use walkdir::WalkDir;

use crate::debounce::{ChangeHook, RawChange, debounce_loop};
use crate::error::{Result, WatchError};
use crate::event::{ChangeKind, FileEvent};
use crate::ignore::IgnoreMatcher;

/// Raw changes buffered between the native callback and the debounce task.
const RAW_CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
    /// Names and glob patterns; see [`IgnoreMatcher`].
    pub ignore: Vec<String>,
    /// Batches buffered for the consumer before new ones are dropped.
    pub channel_capacity: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            ignore: vec![
                ".git".into(),
                "node_modules".into(),
                "dist".into(),
                "build".into(),
                ".cache".into(),
            ],
            channel_capacity: 100,
        }
    }
}

/// Shared between the handle, the debounce task and nothing else.
struct Registry {
    root: PathBuf,
    ignore: IgnoreMatcher,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl Registry {
    fn is_ignored(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(relative) => self.ignore.is_ignored(relative),
            Err(_) => true,
        }
    }

    /// Directories to watch under `dir` and the files already inside them.
    ///
    /// Ignored directories are pruned before descending.
    fn walk(&self, dir: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() == self.root || !self.is_ignored(entry.path()));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
                Ok(entry) => files.push(entry.into_path()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable path while registering watches: {}", e);
                }
            }
        }
        (dirs, files)
    }

    /// Register `dir` and every non-ignored directory below it.
    ///
    /// Returns the files that already exist in the registered directories.
    fn register_tree(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut guard = self.watcher.lock();
        let Some(watcher) = guard.as_mut() else {
            return Ok(Vec::new());
        };

        let (dirs, files) = self.walk(dir);
        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::debug!(
            directories = dirs.len(),
            root = %dir.display(),
            "Registered watch directories"
        );
        Ok(files)
    }
}

/// Picks up directories created after startup.
struct NewDirectories {
    registry: Arc<Registry>,
}

impl ChangeHook for NewDirectories {
    fn on_create(&self, change: &RawChange) -> Vec<RawChange> {
        if !change.path.is_dir() {
            return Vec::new();
        }
        match self.registry.register_tree(&change.path) {
            Ok(files) => files
                .into_iter()
                .map(|file| RawChange::new(file, ChangeKind::Create))
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to watch new directory {}: {}", change.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Recursive, debounced watcher over one root directory.
///
/// Dropping the watcher closes it.
pub struct FileWatcher {
    registry: Arc<Registry>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Must be called inside a tokio runtime. Returns the watcher handle and the
    /// receiver for debounced batches; there is exactly one consumer.
    ///
    /// # Errors
    ///
    /// Fails if the root is missing or not a directory, an ignore pattern is invalid,
    /// or the native watcher cannot be created.
    pub fn watch(
        root: impl AsRef<Path>,
        options: WatchOptions,
    ) -> Result<(Self, mpsc::Receiver<FileEvent>)> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(WatchError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root.to_path_buf()));
        }
        // Native backends report canonical paths.
        let root = root.canonicalize()?;
        let ignore = IgnoreMatcher::new(&options.ignore)?;

        let (raw_tx, raw_rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(options.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let callback_root = root.clone();
        let callback_ignore = ignore.clone();
        let native = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in classify(event) {
                    let ignored = match change.path.strip_prefix(&callback_root) {
                        Ok(relative) => callback_ignore.is_ignored(relative),
                        Err(_) => true,
                    };
                    if ignored {
                        continue;
                    }
                    if raw_tx.try_send(change).is_err() {
                        tracing::warn!("Raw change queue full or closed, dropping change");
                    }
                }
            }
            Err(e) => tracing::warn!("File watcher error: {}", e),
        })?;

        let registry = Arc::new(Registry {
            root: root.clone(),
            ignore,
            watcher: Mutex::new(Some(native)),
        });
        registry.register_tree(&root)?;

        tokio::spawn(debounce_loop(
            raw_rx,
            events_tx,
            options.debounce,
            shutdown_rx,
            NewDirectories {
                registry: Arc::clone(&registry),
            },
        ));

        tracing::info!(root = %root.display(), "Watching for changes");

        Ok((
            Self {
                registry,
                shutdown: shutdown_tx,
                closed: AtomicBool::new(false),
            },
            events_rx,
        ))
    }

    /// Canonical root directory being watched.
    pub fn root(&self) -> &Path {
        &self.registry.root
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop watching and release native handles. Safe to call more than once.
    ///
    /// The event receiver yields whatever was already delivered and then `None`.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the native watcher also drops the callback's raw sender.
        let native = self.registry.watcher.lock().take();
        drop(native);
        let _ = self.shutdown.send(true);
        tracing::debug!(root = %self.registry.root.display(), "File watcher closed");
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a native event onto raw changes. Access and metadata-only events are dropped.
fn classify(event: Event) -> Vec<RawChange> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => return classify_rename(mode, event.paths),
        EventKind::Modify(_) => ChangeKind::Modify,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| RawChange::new(path, kind))
        .collect()
}

fn classify_rename(mode: RenameMode, paths: Vec<PathBuf>) -> Vec<RawChange> {
    match mode {
        RenameMode::From => paths
            .into_iter()
            .map(|p| RawChange::new(p, ChangeKind::Remove))
            .collect(),
        RenameMode::To => paths
            .into_iter()
            .map(|p| RawChange::new(p, ChangeKind::Create))
            .collect(),
        RenameMode::Both => {
            let mut iter = paths.into_iter();
            let mut changes = Vec::new();
            if let Some(from) = iter.next() {
                changes.push(RawChange::new(from, ChangeKind::Remove));
            }
            changes.extend(iter.map(|to| RawChange::new(to, ChangeKind::Create)));
            changes
        }
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|p| {
                let kind = if p.exists() {
                    ChangeKind::Create
                } else {
                    ChangeKind::Remove
                };
                RawChange::new(p, kind)
            })
            .collect(),
    }
}
