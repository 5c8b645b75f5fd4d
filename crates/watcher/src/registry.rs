//! Hierarchical watch registry
//!
//! Owns one native `notify` watcher, the table of subscriptions and the
//! dispatch loop that keeps the two consistent as the tree changes.

use crate::{
    config::RegistryConfig,
    events::{classify, Notification, OperationKind, RawEvent},
    reconcile::{self, Action},
    sink::NotificationSink,
    subscription::{SubscriptionTable, WatchMode, WatchSubscription},
};
use modkeeper_core::error::{Error, Result};
use modkeeper_core::path::{canonical_or_normalized, normalize_path};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace, warn};

/// Watches roots (optionally with their immediate subdirectories) and
/// publishes changes to a [`NotificationSink`].
///
/// Must be created inside a tokio runtime: the dispatch loop runs as a
/// spawned task until [`close`](Self::close) is called or the registry is
/// dropped. A closed registry cannot be reopened.
pub struct WatchRegistry {
    shared: Arc<Shared>,
    /// Cancels the dispatch loop when the registry is dropped
    _shutdown: DropGuard,
}

struct Shared {
    state: RwLock<RegistryState>,
    sink: Box<dyn NotificationSink>,
    cancel: CancellationToken,
}

/// Native handle and subscription table, guarded by one lock
struct RegistryState {
    native: Option<RecommendedWatcher>,
    table: SubscriptionTable,
}

impl WatchRegistry {
    /// Create a registry publishing to `sink`
    pub async fn new(config: RegistryConfig, sink: impl NotificationSink) -> Result<Self> {
        config.validate()?;
        let (event_tx, event_rx) = mpsc::channel(config.queue_capacity);
        let (error_tx, error_rx) = mpsc::channel(config.queue_capacity);

        let native = init_native_with_retry(&config, event_tx, error_tx).await?;

        let cancel = CancellationToken::new();
        let shared = Arc::new(Shared {
            state: RwLock::new(RegistryState {
                native: Some(native),
                table: SubscriptionTable::new(),
            }),
            sink: Box::new(sink),
            cancel: cancel.clone(),
        });

        tokio::spawn(run_dispatch_loop(Arc::clone(&shared), event_rx, error_rx));

        Ok(Self {
            shared,
            _shutdown: cancel.drop_guard(),
        })
    }

    /// Create a registry publishing into a bounded channel
    pub async fn with_channel(
        config: RegistryConfig,
    ) -> Result<(Self, mpsc::Receiver<Notification>)> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let registry = Self::new(config, tx).await?;
        Ok((registry, rx))
    }

    /// Watch `path` as a root; notifications carry only `event_key`.
    pub async fn watch(&self, path: impl AsRef<Path>, event_key: impl Into<String>) -> Result<()> {
        let path = canonical_or_normalized(path.as_ref());
        let event_key = event_key.into();

        let mut state = self.shared.state.write().await;
        state.watch_native(&path)?;

        let replaced = state.table.remove(&path);
        state.release_native(
            replaced
                .iter()
                .map(|sub| sub.path.as_path())
                .filter(|p| *p != path),
        );
        state
            .table
            .insert(WatchSubscription::root(&path, &event_key, WatchMode::Simple));

        info!("Watching {} under key {:?}", path.display(), event_key);
        Ok(())
    }

    /// Watch `path` as a root together with its immediate subdirectories.
    ///
    /// Subdirectories that cannot be watched are skipped. If `path` itself
    /// cannot be listed, the root watch is rolled back and
    /// [`Error::Enumeration`] is returned with the registry unchanged.
    pub async fn watch_one_level(
        &self,
        path: impl AsRef<Path>,
        event_key: impl Into<String>,
    ) -> Result<()> {
        let path = canonical_or_normalized(path.as_ref());
        let event_key = event_key.into();

        let mut state = self.shared.state.write().await;
        let previously_watched = state.table.contains(&path);
        state.watch_native(&path)?;

        let subdirectories = match list_subdirectories(&path).await {
            Ok(subdirectories) => subdirectories,
            Err(e) => {
                if !previously_watched {
                    state.release_native(std::iter::once(path.as_path()));
                }
                warn!("Failed to enumerate {}: {}", path.display(), e);
                return Err(Error::enumeration(&path, e));
            }
        };

        let replaced = state.table.remove(&path);
        state.release_native(
            replaced
                .iter()
                .map(|sub| sub.path.as_path())
                .filter(|p| *p != path),
        );

        let root = WatchSubscription::root(&path, &event_key, WatchMode::OneLevel);
        let mut tracked = 0usize;
        for subdirectory in subdirectories {
            // A separately registered root keeps its own key and children
            if let Some(existing) = state.table.get(&subdirectory).filter(|sub| sub.is_root()) {
                debug!(
                    "Keeping {} as its own root under key {:?}",
                    subdirectory.display(),
                    existing.event_key
                );
                continue;
            }
            match state.watch_native(&subdirectory) {
                Ok(()) => {
                    state
                        .table
                        .insert(WatchSubscription::child(&subdirectory, &root));
                    tracked += 1;
                }
                Err(e) => warn!("Skipping subdirectory: {}", e),
            }
        }
        state.table.insert(root);

        info!(
            "Watching {} and {} subdirectories under key {:?}",
            path.display(),
            tracked,
            event_key
        );
        Ok(())
    }

    /// Stop watching `path`; a root takes its children with it.
    pub async fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
        let requested = path.as_ref();

        let mut state = self.shared.state.write().await;
        let key = state.lookup_key(requested);
        let removed = state.table.remove(&key);
        if removed.is_empty() {
            return Err(Error::not_watched(requested));
        }

        state.release_native(removed.iter().map(|sub| sub.path.as_path()));
        info!(
            "Stopped watching {} ({} subscriptions removed)",
            key.display(),
            removed.len()
        );
        Ok(())
    }

    /// Release the native watcher and stop the dispatch loop.
    ///
    /// All subscriptions are dropped. Closing twice is a caller error; the
    /// second call is logged and otherwise ignored.
    pub async fn close(&self) -> Result<()> {
        self.shared.cancel.cancel();

        let mut state = self.shared.state.write().await;
        match state.native.take() {
            Some(native) => {
                drop(native);
                state.table.clear();
                info!("Watch registry closed");
            }
            None => debug!("Watch registry already closed"),
        }
        Ok(())
    }

    /// Get currently watched paths, sorted
    pub async fn watched_paths(&self) -> Vec<PathBuf> {
        self.shared.state.read().await.table.paths()
    }

    /// Get the subscription for `path`, if tracked
    pub async fn subscription(&self, path: impl AsRef<Path>) -> Option<WatchSubscription> {
        let state = self.shared.state.read().await;
        let key = state.lookup_key(path.as_ref());
        state.table.get(&key).cloned()
    }

    /// Check if `path` has a subscription
    pub async fn is_watching(&self, path: impl AsRef<Path>) -> bool {
        self.subscription(path).await.is_some()
    }

    /// Check if [`close`](Self::close) has been called or the registry dropped
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

impl RegistryState {
    fn native_mut(&mut self, path: &Path) -> Result<&mut RecommendedWatcher> {
        self.native
            .as_mut()
            .ok_or_else(|| Error::watch(path, "watch registry is closed"))
    }

    fn watch_native(&mut self, path: &Path) -> Result<()> {
        self.native_mut(path)?
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::watch(path, e.to_string()))
    }

    /// Best-effort native removal; the kernel drops watches on deleted
    /// directories by itself, so failures are expected and only logged.
    fn release_native<'a>(&mut self, paths: impl Iterator<Item = &'a Path>) {
        let Some(native) = self.native.as_mut() else {
            return;
        };
        for path in paths {
            if let Err(e) = native.unwatch(path) {
                debug!("Native watch for {} not removed: {}", path.display(), e);
            }
        }
    }

    /// Table key for a caller-supplied path: the lexical form if tracked,
    /// otherwise the canonical form used at registration.
    fn lookup_key(&self, path: &Path) -> PathBuf {
        let normalized = normalize_path(path);
        if self.table.contains(&normalized) {
            normalized
        } else {
            canonical_or_normalized(path)
        }
    }

    fn promote(&mut self, path: &Path, root: &Path) {
        let Some(root) = self
            .table
            .get(root)
            .filter(|sub| sub.is_root() && sub.mode == WatchMode::OneLevel)
            .cloned()
        else {
            return;
        };
        if self.table.contains(path) {
            return;
        }

        match self.watch_native(path) {
            Ok(()) => {
                self.table.insert(WatchSubscription::child(path, &root));
                debug!("Tracking new subdirectory {}", path.display());
            }
            Err(e) => warn!("Not tracking new subdirectory: {}", e),
        }
    }

    fn demote(&mut self, path: &Path) {
        let removed = self.table.remove(path);
        if removed.is_empty() {
            return;
        }
        self.release_native(removed.iter().map(|sub| sub.path.as_path()));
        debug!(
            "Stopped tracking {} ({} subscriptions)",
            path.display(),
            removed.len()
        );
    }
}

impl Shared {
    async fn dispatch(&self, event: NotifyEvent) {
        for raw in classify(&event) {
            self.dispatch_raw(raw).await;
        }
    }

    async fn dispatch_raw(&self, raw: RawEvent) {
        trace!("Dispatching {} {}", raw.op, raw.path.display());

        let is_dir = raw.op == OperationKind::Create
            && tokio::fs::metadata(&raw.path)
                .await
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);

        let plan = {
            let state = self.state.read().await;
            reconcile::plan(&state.table, &raw, is_dir)
        };

        match &plan.action {
            Action::Promote { path, root } => self.state.write().await.promote(path, root),
            Action::Demote { path } => self.state.write().await.demote(path),
            Action::None => {}
        }

        match plan.notification {
            Some(notification) => self.sink.emit(notification),
            None => trace!("No subscription for {}", raw.path.display()),
        }
    }
}

async fn run_dispatch_loop(
    shared: Arc<Shared>,
    mut events: mpsc::Receiver<NotifyEvent>,
    mut errors: mpsc::Receiver<notify::Error>,
) {
    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => shared.dispatch(event).await,
                None => break,
            },
            err = errors.recv() => match err {
                Some(err) => {
                    warn!("Native watcher error: {}", err);
                    shared.sink.emit(Notification::WatcherError {
                        message: err.to_string(),
                    });
                }
                None => break,
            },
        }
    }
    debug!("Dispatch loop stopped");
}

/// Initialize the native watcher with retry logic
async fn init_native_with_retry(
    config: &RegistryConfig,
    event_tx: mpsc::Sender<NotifyEvent>,
    error_tx: mpsc::Sender<notify::Error>,
) -> Result<RecommendedWatcher> {
    let max_attempts = config.max_init_retries.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match create_native_watcher(event_tx.clone(), error_tx.clone()) {
            Ok(watcher) => {
                debug!("Native watcher initialized");
                return Ok(watcher);
            }
            Err(e) if attempts < max_attempts => {
                warn!(
                    "Failed to initialize native watcher (attempt {}/{}): {}",
                    attempts, max_attempts, e
                );
                tokio::time::sleep(config.retry_delay()).await;
            }
            Err(e) => {
                error!("Failed to initialize native watcher after {} attempts", attempts);
                return Err(Error::watch(
                    PathBuf::new(),
                    format!("native watcher initialization failed: {e}"),
                ));
            }
        }
    }
}

/// The callback runs on the backend's thread and must never block.
fn create_native_watcher(
    event_tx: mpsc::Sender<NotifyEvent>,
    error_tx: mpsc::Sender<notify::Error>,
) -> notify::Result<RecommendedWatcher> {
    RecommendedWatcher::new(
        move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
            Ok(event) => {
                if let Err(e) = event_tx.try_send(event) {
                    error!("Failed to queue filesystem event: {}", e);
                }
            }
            Err(err) => {
                if let Err(e) = error_tx.try_send(err) {
                    error!("Failed to queue watcher error: {}", e);
                }
            }
        },
        NotifyConfig::default(),
    )
}

async fn list_subdirectories(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut subdirectories = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => subdirectories.push(entry.path()),
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    subdirectories.sort();
    Ok(subdirectories)
}
