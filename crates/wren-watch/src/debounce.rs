//! Trailing-edge debouncing of raw changes into [`FileEvent`] batches.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::event::{ChangeKind, FileEvent};

/// A raw change reported by the native watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl RawChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Changes collected since the last flush.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    paths: BTreeSet<PathBuf>,
    has_creates: bool,
    has_deletes: bool,
    has_package_metadata_change: bool,
}

impl PendingBatch {
    pub fn record(&mut self, change: RawChange) {
        match change.kind {
            ChangeKind::Create => self.has_creates = true,
            ChangeKind::Remove => self.has_deletes = true,
            ChangeKind::Modify => {}
        }
        if change.path.file_name().is_some_and(|name| name == "package.json") {
            self.has_package_metadata_change = true;
        }
        self.paths.insert(change.path);
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Turn the collected changes into an event and reset.
    pub fn take(&mut self) -> Option<FileEvent> {
        if self.is_empty() {
            return None;
        }
        let batch = std::mem::take(self);
        Some(FileEvent {
            paths: batch.paths.into_iter().collect(),
            has_creates: batch.has_creates,
            has_deletes: batch.has_deletes,
            has_package_metadata_change: batch.has_package_metadata_change,
            timestamp: SystemTime::now(),
        })
    }
}

/// Hook for creations that need work beyond batching (new directories).
///
/// Runs on the blocking pool, so it may touch the filesystem.
pub(crate) trait ChangeHook: Send + Sync + 'static {
    /// Extra changes to record alongside the created path `change`.
    fn on_create(&self, change: &RawChange) -> Vec<RawChange>;
}

#[cfg(test)]
pub(crate) struct NoHook;

#[cfg(test)]
impl ChangeHook for NoHook {
    fn on_create(&self, _change: &RawChange) -> Vec<RawChange> {
        Vec::new()
    }
}

/// Collect raw changes and emit a batch once `window` passes without a new one.
///
/// Runs until shutdown is signalled or every raw sender is gone. Pending changes at
/// shutdown are discarded.
pub(crate) async fn debounce_loop<H: ChangeHook>(
    mut raw_rx: mpsc::Receiver<RawChange>,
    events_tx: mpsc::Sender<FileEvent>,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
    hook: H,
) {
    let hook = Arc::new(hook);
    let mut pending = PendingBatch::default();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            raw = raw_rx.recv() => {
                let Some(change) = raw else { break };
                if change.kind == ChangeKind::Create {
                    for extra in run_hook(&hook, &change).await {
                        pending.record(extra);
                    }
                }
                pending.record(change);
                deadline = Some(Instant::now() + window);
            }

            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() =>
            {
                deadline = None;
                if let Some(event) = pending.take() {
                    deliver(&events_tx, event);
                }
            }
        }
    }

    tracing::debug!("File watcher debounce loop stopped");
}

async fn run_hook<H: ChangeHook>(hook: &Arc<H>, change: &RawChange) -> Vec<RawChange> {
    let hook = Arc::clone(hook);
    let created = change.clone();
    match tokio::task::spawn_blocking(move || hook.on_create(&created)).await {
        Ok(extra) => extra,
        Err(e) => {
            tracing::warn!(path = %change.path.display(), "Change hook failed: {}", e);
            Vec::new()
        }
    }
}

/// Non-blocking send; when the consumer is behind the batch is dropped.
fn deliver(events_tx: &mpsc::Sender<FileEvent>, event: FileEvent) {
    let count = event.paths.len();
    match events_tx.try_send(event) {
        Ok(()) => tracing::debug!(paths = count, "Emitted file change batch"),
        Err(mpsc::error::TrySendError::Full(event)) => {
            tracing::warn!(
                paths = count,
                first = %event.paths.first().map(|p| p.display().to_string()).unwrap_or_default(),
                "Event channel full, dropping file change batch"
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!("Event receiver gone, discarding file change batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    struct Harness {
        raw_tx: mpsc::Sender<RawChange>,
        events_rx: mpsc::Receiver<FileEvent>,
        shutdown_tx: watch::Sender<bool>,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn_loop(capacity: usize) -> Harness {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(debounce_loop(raw_rx, events_tx, WINDOW, shutdown_rx, NoHook));
        Harness {
            raw_tx,
            events_rx,
            shutdown_tx,
            task,
        }
    }

    async fn settle() {
        // Let the loop observe everything sent so far.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn pending_batch_classifies_changes() {
        let mut batch = PendingBatch::default();
        batch.record(RawChange::new("/p/src/a.js", ChangeKind::Modify));
        batch.record(RawChange::new("/p/src/a.js", ChangeKind::Modify));
        batch.record(RawChange::new("/p/src/new.js", ChangeKind::Create));
        batch.record(RawChange::new("/p/packages/ui/package.json", ChangeKind::Modify));

        let event = batch.take().unwrap();
        assert_eq!(event.paths.len(), 3);
        assert!(event.has_creates);
        assert!(!event.has_deletes);
        assert!(event.has_package_metadata_change);
        assert!(batch.take().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_within_window_yields_one_event() {
        let mut h = spawn_loop(8);

        for n in 0..5 {
            h.raw_tx
                .send(RawChange::new(format!("/p/f{n}.js"), ChangeKind::Modify))
                .await
                .unwrap();
            tokio::time::advance(Duration::from_millis(20)).await;
        }

        let event = h.events_rx.recv().await.unwrap();
        assert_eq!(event.paths.len(), 5);

        tokio::time::advance(WINDOW * 3).await;
        settle().await;
        assert!(h.events_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn writes_spaced_beyond_window_yield_separate_events() {
        let mut h = spawn_loop(8);

        h.raw_tx
            .send(RawChange::new("/p/a.js", ChangeKind::Modify))
            .await
            .unwrap();
        let first = h.events_rx.recv().await.unwrap();

        h.raw_tx
            .send(RawChange::new("/p/b.js", ChangeKind::Remove))
            .await
            .unwrap();
        let second = h.events_rx.recv().await.unwrap();

        assert_eq!(first.paths, vec![PathBuf::from("/p/a.js")]);
        assert_eq!(second.paths, vec![PathBuf::from("/p/b.js")]);
        assert!(second.has_deletes);
    }

    #[tokio::test(start_paused = true)]
    async fn full_channel_drops_newest_batch() {
        let mut h = spawn_loop(1);

        h.raw_tx
            .send(RawChange::new("/p/first.js", ChangeKind::Modify))
            .await
            .unwrap();
        settle().await;
        tokio::time::advance(WINDOW * 2).await;
        settle().await;

        h.raw_tx
            .send(RawChange::new("/p/second.js", ChangeKind::Modify))
            .await
            .unwrap();
        settle().await;
        tokio::time::advance(WINDOW * 2).await;
        settle().await;

        let kept = h.events_rx.recv().await.unwrap();
        assert_eq!(kept.paths, vec![PathBuf::from("/p/first.js")]);
        assert!(h.events_rx.try_recv().is_err());
    }

    struct CreatedChild;

    impl ChangeHook for CreatedChild {
        fn on_create(&self, change: &RawChange) -> Vec<RawChange> {
            vec![RawChange::new(change.path.join("child.js"), ChangeKind::Create)]
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hook_changes_join_the_batch_for_creations_only() {
        let (raw_tx, raw_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(debounce_loop(raw_rx, events_tx, WINDOW, shutdown_rx, CreatedChild));

        raw_tx
            .send(RawChange::new("/p/fresh", ChangeKind::Create))
            .await
            .unwrap();
        raw_tx
            .send(RawChange::new("/p/edited", ChangeKind::Modify))
            .await
            .unwrap();

        let event = events_rx.recv().await.unwrap();
        assert_eq!(
            event.paths,
            vec![
                PathBuf::from("/p/edited"),
                PathBuf::from("/p/fresh"),
                PathBuf::from("/p/fresh/child.js"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_loop() {
        let h = spawn_loop(8);
        h.raw_tx
            .send(RawChange::new("/p/a.js", ChangeKind::Modify))
            .await
            .unwrap();
        h.shutdown_tx.send(true).unwrap();

        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_every_sender_stops_the_loop() {
        let h = spawn_loop(8);
        drop(h.raw_tx);
        h.task.await.unwrap();
    }
}
