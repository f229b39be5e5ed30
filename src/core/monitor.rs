// src/core/monitor.rs
//! The poll → classify → persist loop
//!
//! A [`ClipboardMonitor`] is configured while stopped and consumed by
//! [`ClipboardMonitor::start`], which returns a [`MonitorHandle`] for the
//! running loop. Once stopped the loop is finished; monitoring again means
//! building a new monitor.
//!
//! The clipboard baseline is taken inside `start`, before the loop task is
//! spawned, so anything copied after `start` returns is seen by the first poll.
//!
//! Ticks never overlap: the loop awaits each store write before it waits on
//! the next interval tick, and shutdown is only observed between ticks.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::core::classifier::Classifier;
use crate::core::detector::{ChangeDetector, ClipboardSource, ForegroundAppSource};
use crate::core::store::{InsertOutcome, LazyStore};
use crate::core::types::{ClipboardEntry, EntryListener, MonitorStats, PollOutcome};

/// Default polling interval
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    NoText,
    Stored(ClipboardEntry),
    Duplicate,
    Failed,
}

/// A clipboard monitor that has not been started yet
pub struct ClipboardMonitor {
    clipboard: Box<dyn ClipboardSource>,
    foreground: Box<dyn ForegroundAppSource>,
    classifier: Classifier,
    store: LazyStore,
    listeners: Vec<Box<dyn EntryListener>>,
    interval: Duration,
}

impl ClipboardMonitor {
    /// `store` is an open [`EntryStore`](crate::core::store::EntryStore) or a
    /// [`LazyStore`] that opens on first write
    pub fn new<C, F, S>(clipboard: C, foreground: F, store: S) -> Self
    where
        C: ClipboardSource + 'static,
        F: ForegroundAppSource + 'static,
        S: Into<LazyStore>,
    {
        Self {
            clipboard: Box::new(clipboard),
            foreground: Box::new(foreground),
            classifier: Classifier::default(),
            store: store.into(),
            listeners: Vec::new(),
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Add a listener notified of every newly stored entry
    pub fn add_listener<T: EntryListener + 'static>(&mut self, listener: T) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> MonitorState {
        MonitorState::Stopped
    }

    /// Capture the clipboard baseline and spawn the polling loop on the tokio runtime
    pub fn start(self) -> MonitorHandle {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(shutdown.clone()));
        MonitorHandle { shutdown, task }
    }

    /// Capture the baseline now and return the polling loop, which runs until
    /// `shutdown` is cancelled
    pub fn run(
        self,
        shutdown: CancellationToken,
    ) -> impl Future<Output = MonitorStats> + Send + 'static {
        let interval = self.interval;
        let pipeline = self.into_pipeline();
        pipeline.run(interval, shutdown)
    }

    fn into_pipeline(self) -> Pipeline {
        Pipeline {
            detector: ChangeDetector::new(self.clipboard),
            foreground: self.foreground,
            classifier: self.classifier,
            store: self.store,
            listeners: self.listeners,
            stats: MonitorStats::default(),
        }
    }
}

/// Handle to a running monitor loop
pub struct MonitorHandle {
    shutdown: CancellationToken,
    task: JoinHandle<MonitorStats>,
}

impl MonitorHandle {
    /// Request the loop to stop after the current tick. Safe to call repeatedly.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Stop requested");
        }
        self.shutdown.cancel();
    }

    /// Token that stops the loop when cancelled, for wiring into signal handlers
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn state(&self) -> MonitorState {
        if self.shutdown.is_cancelled() || self.task.is_finished() {
            MonitorState::Stopped
        } else {
            MonitorState::Running
        }
    }

    /// Wait for the loop to exit and return its counters
    pub async fn join(self) -> anyhow::Result<MonitorStats> {
        Ok(self.task.await?)
    }
}

/// State owned by the running loop
struct Pipeline {
    detector: ChangeDetector<Box<dyn ClipboardSource>>,
    foreground: Box<dyn ForegroundAppSource>,
    classifier: Classifier,
    store: LazyStore,
    listeners: Vec<Box<dyn EntryListener>>,
    stats: MonitorStats,
}

impl Pipeline {
    async fn run(mut self, interval: Duration, shutdown: CancellationToken) -> MonitorStats {
        for listener in &mut self.listeners {
            listener.on_monitoring_started();
        }
        info!(
            "👀 Clipboard monitoring started (every {} ms)",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the baseline was just taken.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let stats = self.stats;
        for listener in &mut self.listeners {
            listener.on_monitoring_stopped(&stats);
        }
        info!(
            ticks = stats.ticks,
            changes = stats.changes,
            stored = stats.stored,
            duplicates = stats.duplicates,
            non_text = stats.non_text,
            failures = stats.failures,
            "🛑 Clipboard monitoring stopped"
        );
        stats
    }

    async fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        let text = match self.detector.poll() {
            PollOutcome::Unchanged => return TickOutcome::Unchanged,
            PollOutcome::NoText => {
                self.stats.changes += 1;
                self.stats.non_text += 1;
                debug!("Clipboard changed to non-text content, skipping");
                return TickOutcome::NoText;
            }
            PollOutcome::Text(text) => text,
        };
        self.stats.changes += 1;

        let captured_at = Utc::now();
        let source_app = self.foreground.foreground_app();
        let metadata = self.classifier.classify(&text);
        let entry = ClipboardEntry::from_parts(text, metadata, source_app, captured_at);

        trace!(
            hash = entry.short_hash(),
            content_type = %entry.content_type,
            chars = entry.character_count,
            "Clipboard entry classified"
        );

        match self.store.insert(&entry).await {
            Ok(InsertOutcome::Inserted) => {
                self.stats.stored += 1;
                debug!(
                    hash = entry.short_hash(),
                    content_type = %entry.content_type,
                    app = entry.app_name.as_deref().unwrap_or("-"),
                    "Stored clipboard entry"
                );
                for listener in &mut self.listeners {
                    listener.on_entry_captured(&entry);
                }
                TickOutcome::Stored(entry)
            }
            Ok(InsertOutcome::Duplicate) => {
                self.stats.duplicates += 1;
                TickOutcome::Duplicate
            }
            Err(e) => {
                // Losing one entry must not stop monitoring.
                self.stats.failures += 1;
                let e = anyhow::Error::new(e);
                if self.store.is_open() {
                    error!("❌ Failed to store clipboard entry: {:#}", e);
                } else {
                    error!(
                        "❌ Clipboard database {} unavailable, entry dropped: {:#}",
                        self.store.path().display(),
                        e
                    );
                }
                TickOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::tests::FakeClipboard;
    use crate::core::detector::NoForegroundApp;
    use crate::core::store::EntryStore;
    use crate::core::types::{ContentType, SourceApp};
    use std::sync::{Arc, Mutex};

    struct FixedApp;

    impl ForegroundAppSource for FixedApp {
        fn foreground_app(&self) -> Option<SourceApp> {
            Some(SourceApp::new("TextEdit", "com.apple.TextEdit"))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingListener {
        captured: Arc<Mutex<Vec<String>>>,
        stopped: Arc<Mutex<Option<MonitorStats>>>,
    }

    impl EntryListener for RecordingListener {
        fn on_entry_captured(&mut self, entry: &ClipboardEntry) {
            self.captured.lock().unwrap().push(entry.content.clone());
        }

        fn on_monitoring_stopped(&mut self, stats: &MonitorStats) {
            *self.stopped.lock().unwrap() = Some(*stats);
        }
    }

    async fn open_store(dir: &tempfile::TempDir) -> EntryStore {
        EntryStore::open(dir.path().join("clipboard.db")).await.unwrap()
    }

    fn monitor<F, S>(clipboard: &FakeClipboard, foreground: F, store: S) -> ClipboardMonitor
    where
        F: ForegroundAppSource + 'static,
        S: Into<LazyStore>,
    {
        ClipboardMonitor::new(clipboard.clone(), foreground, store)
            .with_classifier(Classifier::without_language())
    }

    #[tokio::test]
    async fn test_tick_stores_new_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let mut pipeline = monitor(&clipboard, FixedApp, store.clone()).into_pipeline();

        clipboard.copy("Meeting on 2024-01-15 at noon");
        let entry = match pipeline.tick().await {
            TickOutcome::Stored(entry) => entry,
            other => panic!("expected a stored entry, got {other:?}"),
        };
        assert_eq!(entry.content_type, ContentType::DateContaining);
        assert_eq!(entry.app_name.as_deref(), Some("TextEdit"));
        assert_eq!(entry.app_bundle_id.as_deref(), Some("com.apple.TextEdit"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_baseline_content_not_captured() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::with_text("copied before startup");
        let mut pipeline = monitor(&clipboard, NoForegroundApp, store.clone()).into_pipeline();

        assert_eq!(pipeline.tick().await, TickOutcome::Unchanged);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_token_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let mut pipeline = monitor(&clipboard, NoForegroundApp, store.clone()).into_pipeline();

        clipboard.copy("hello world");
        assert!(matches!(pipeline.tick().await, TickOutcome::Stored(_)));
        assert_eq!(pipeline.tick().await, TickOutcome::Unchanged);
        assert_eq!(pipeline.tick().await, TickOutcome::Unchanged);

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(pipeline.stats.ticks, 3);
        assert_eq!(pipeline.stats.stored, 1);
    }

    #[tokio::test]
    async fn test_recopy_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let mut pipeline = monitor(&clipboard, NoForegroundApp, store.clone()).into_pipeline();

        clipboard.copy("user@example.com");
        assert!(matches!(pipeline.tick().await, TickOutcome::Stored(_)));
        clipboard.copy("something else");
        assert!(matches!(pipeline.tick().await, TickOutcome::Stored(_)));
        clipboard.copy("user@example.com");
        assert_eq!(pipeline.tick().await, TickOutcome::Duplicate);

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(pipeline.stats.duplicates, 1);
    }

    #[tokio::test]
    async fn test_non_text_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let mut pipeline = monitor(&clipboard, NoForegroundApp, store.clone()).into_pipeline();

        clipboard.copy_non_text();
        assert_eq!(pipeline.tick().await, TickOutcome::NoText);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(pipeline.stats.non_text, 1);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_loop_alive() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let mut pipeline = monitor(&clipboard, NoForegroundApp, store.clone()).into_pipeline();

        store.close().await;
        clipboard.copy("lost entry");
        assert_eq!(pipeline.tick().await, TickOutcome::Failed);
        assert_eq!(pipeline.stats.failures, 1);

        // The next change is still detected
        clipboard.copy("next entry");
        assert_eq!(pipeline.tick().await, TickOutcome::Failed);
        assert_eq!(pipeline.stats.changes, 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_retried_on_later_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("history");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let db_path = blocker.join("clipboard.db");
        let clipboard = FakeClipboard::default();
        let mut pipeline =
            monitor(&clipboard, NoForegroundApp, LazyStore::new(&db_path)).into_pipeline();

        clipboard.copy("dropped while the database is unavailable");
        assert_eq!(pipeline.tick().await, TickOutcome::Failed);
        assert!(!pipeline.store.is_open());
        assert_eq!(pipeline.tick().await, TickOutcome::Unchanged);

        std::fs::remove_file(&blocker).unwrap();
        clipboard.copy("stored once the database opens");
        assert!(matches!(pipeline.tick().await, TickOutcome::Stored(_)));
        assert!(pipeline.store.is_open());
        assert_eq!(pipeline.stats.failures, 1);
        assert_eq!(pipeline.stats.stored, 1);

        let store = EntryStore::open(&db_path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_loop_keeps_ticking_without_database() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("history");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let clipboard = FakeClipboard::default();

        let handle = monitor(
            &clipboard,
            NoForegroundApp,
            LazyStore::new(blocker.join("clipboard.db")),
        )
        .with_interval(Duration::from_millis(10))
        .start();

        clipboard.copy("first");
        tokio::time::sleep(Duration::from_millis(50)).await;
        clipboard.copy("second");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), MonitorState::Running);

        handle.stop();
        let stats = handle.join().await.unwrap();
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.stored, 0);
        assert!(stats.ticks > 2);
    }

    #[tokio::test]
    async fn test_copy_right_after_start_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::with_text("present before start");

        let handle = monitor(&clipboard, NoForegroundApp, store.clone())
            .with_interval(Duration::from_millis(10))
            .start();
        clipboard.copy("copied immediately after start");

        let mut waited = Duration::ZERO;
        while store.count().await.unwrap() == 0 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        handle.stop();
        let stats = handle.join().await.unwrap();

        assert_eq!(stats.stored, 1);
        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].entry.content, "copied immediately after start");
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let clipboard = FakeClipboard::default();
        let listener = RecordingListener::default();

        let mut monitor = monitor(&clipboard, NoForegroundApp, store.clone())
            .with_interval(Duration::from_millis(10));
        monitor.add_listener(listener.clone());
        assert_eq!(monitor.state(), MonitorState::Stopped);

        let handle = monitor.start();
        assert_eq!(handle.state(), MonitorState::Running);

        clipboard.copy("captured while running");

        let mut waited = Duration::ZERO;
        while store.count().await.unwrap() == 0 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }

        handle.stop();
        handle.stop();
        assert_eq!(handle.state(), MonitorState::Stopped);
        let stats = handle.join().await.unwrap();

        assert_eq!(stats.stored, 1);
        assert_eq!(
            *listener.captured.lock().unwrap(),
            vec!["captured while running".to_string()]
        );
        assert_eq!(*listener.stopped.lock().unwrap(), Some(stats));

        // No polls after stop
        clipboard.copy("after stop");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
