//! Recursive watcher over the sync root with batched delivery.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::WatchError;
use crate::activity::{ChangeEvent, ChangeKind};

/// Watches the sync root and delivers batches of root-relative changes.
///
/// The batch callback runs on the delivery thread, so it must return quickly;
/// [`ActivityEngine::on_batch`](crate::activity::ActivityEngine::on_batch) does.
pub struct RootWatcher {
    root: PathBuf,
    /// Dropped on stop so notify releases its OS handles.
    watcher: Option<RecommendedWatcher>,
    stop_tx: Sender<()>,
    delivery: Option<JoinHandle<()>>,
}

impl RootWatcher {
    /// Start watching `root` recursively.
    ///
    /// Events arriving within `batch_window` of the first event of a batch are
    /// delivered together.
    pub fn start<F>(root: &Path, batch_window: Duration, on_batch: F) -> Result<Self, WatchError>
    where
        F: Fn(&[ChangeEvent]) + Send + 'static,
    {
        if !root.is_dir() {
            return Err(WatchError::RootMissing {
                path: root.to_path_buf(),
            });
        }

        // FSEvents reports canonical paths (e.g. /private/var on macOS)
        let canonical = root.canonicalize().map_err(|e| WatchError::PathWatchFailed {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<Vec<ChangeEvent>>();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let callback_roots = [canonical.clone(), root.to_path_buf()];
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let changes = to_change_events(&callback_roots, &event);
                    if !changes.is_empty() {
                        // Receiver gone means we are shutting down
                        let _ = event_tx.send(changes);
                    }
                }
                Err(e) => {
                    tracing::warn!("[watcher] file watch error: {e}");
                }
            }
        })?;

        watcher
            .watch(&canonical, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: canonical.clone(),
                reason: e.to_string(),
            })?;

        let delivery = std::thread::Builder::new()
            .name("reposync-watcher".to_string())
            .spawn(move || deliver(event_rx, stop_rx, batch_window, on_batch))
            .map_err(|e| WatchError::DeliveryThread {
                reason: e.to_string(),
            })?;

        crate::log_event!("watcher", "started", "{}", canonical.display());

        Ok(Self {
            root: canonical,
            watcher: Some(watcher),
            stop_tx,
            delivery: Some(delivery),
        })
    }

    /// Canonical path being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching and wait for the delivery thread to exit.
    ///
    /// A batch already being delivered finishes first.
    pub fn stop(&mut self) {
        drop(self.watcher.take());
        let _ = self.stop_tx.try_send(());

        if let Some(delivery) = self.delivery.take() {
            if delivery.join().is_err() {
                tracing::error!("[watcher] delivery thread panicked");
            }
            crate::log_event!("watcher", "stopped", "{}", self.root.display());
        }
    }
}

impl Drop for RootWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Delivery loop: block for the first event, gather the rest of the window,
/// hand the batch over, repeat.
fn deliver<F>(
    events: Receiver<Vec<ChangeEvent>>,
    stop: Receiver<()>,
    window: Duration,
    on_batch: F,
) where
    F: Fn(&[ChangeEvent]),
{
    loop {
        let mut batch = select! {
            recv(stop) -> _ => return,
            recv(events) -> msg => match msg {
                Ok(changes) => changes,
                Err(_) => return,
            },
        };

        let deadline = Instant::now() + window;
        while let Ok(more) = events.recv_deadline(deadline) {
            batch.extend(more);
        }

        crate::debug_event!("watcher", "batch", "{} changes", batch.len());
        on_batch(&batch);
    }
}

fn to_change_events(roots: &[PathBuf], event: &Event) -> Vec<ChangeEvent> {
    let Some(kind) = change_kind(&event.kind) else {
        return Vec::new();
    };

    event
        .paths
        .iter()
        .filter_map(|path| roots.iter().find_map(|root| relative_path(root, path)))
        .map(|path| ChangeEvent::new(path, kind))
        .collect()
}

/// Map a notify event kind; `None` for read-only access.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeKind::Modified),
        EventKind::Access(_) => None,
        EventKind::Any | EventKind::Other => Some(ChangeKind::Other),
    }
}

/// Path relative to `root` as a string; `None` for the root itself or for
/// paths outside it.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_string_lossy().into_owned())
}
