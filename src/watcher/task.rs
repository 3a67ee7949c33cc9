//! The watcher's background task: one select loop over stop, raw
//! notifications, the coalescing buffer and its timers.

use async_channel as chan;
use notify::RecommendedWatcher;
use std::path::{Component, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::{open_handle, RawNotification};
use crate::config::WatcherConfig;
use crate::event::{Event, ServiceRef};

/// Directory names whose changes never trigger an event.
const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

pub(super) struct WatchTask {
    pub(super) service: ServiceRef,
    pub(super) path: PathBuf,
    pub(super) config: WatcherConfig,
    /// Owned exclusively by this task; replaced wholesale on error
    pub(super) handle: Option<RecommendedWatcher>,
    pub(super) raw_tx: chan::Sender<RawNotification>,
    pub(super) raw_rx: chan::Receiver<RawNotification>,
    pub(super) events_tx: chan::Sender<Event>,
    pub(super) stop_rx: chan::Receiver<()>,
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl WatchTask {
    pub(super) async fn run(mut self) {
        let (coalesce_tx, coalesce_rx) =
            chan::bounded::<Vec<PathBuf>>(self.config.coalesce_capacity.max(1));
        let debounce = Duration::from_millis(self.config.debounce_ms);

        let mut pending = 0usize;
        let mut flush_at: Option<Instant> = None;
        let mut retry_at: Option<Instant> = None;

        info!("Source watcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.stop_rx.recv() => break,

                raw = self.raw_rx.recv() => match raw {
                    Ok(Ok(event)) => self.on_change(event, &coalesce_tx),
                    Ok(Err(err)) => {
                        warn!(error = %err, "Watch error, re-registering path");
                        retry_at = self.reopen();
                    }
                    Err(_) => break,
                },

                Ok(paths) = coalesce_rx.recv() => {
                    let mut merged = 1;
                    trace!(?paths, "Coalescing change");
                    while coalesce_rx.try_recv().is_ok() {
                        merged += 1;
                    }
                    if debounce.is_zero() {
                        self.emit(merged);
                    } else {
                        pending += merged;
                        flush_at.get_or_insert_with(|| Instant::now() + debounce);
                    }
                }

                _ = until(flush_at) => {
                    flush_at = None;
                    self.emit(std::mem::take(&mut pending));
                }

                _ = until(retry_at) => {
                    retry_at = self.reopen();
                }
            }
        }

        drop(self.handle.take());
        info!("Source watcher stopped");
    }

    fn on_change(&self, event: notify::Event, coalesce_tx: &chan::Sender<Vec<PathBuf>>) {
        if self.config.ignore_access && event.kind.is_access() {
            return;
        }
        if !event.paths.is_empty() && event.paths.iter().all(|p| self.is_ignored(p)) {
            return;
        }
        if coalesce_tx.try_send(event.paths).is_err() {
            debug!("Coalescing buffer full, dropping notification");
        }
    }

    fn is_ignored(&self, path: &std::path::Path) -> bool {
        let relative = path.strip_prefix(&self.path).unwrap_or(path);
        relative.components().any(|c| match c {
            Component::Normal(name) => IGNORED_DIRS.iter().any(|d| name == *d),
            _ => false,
        })
    }

    /// Emits one `Update` for `merged` coalesced notifications.
    fn emit(&self, merged: usize) {
        if merged == 0 {
            return;
        }
        let event = Event::update(self.service.clone());
        match self.events_tx.try_send(event) {
            Ok(()) => debug!(merged, "Source change emitted"),
            Err(chan::TrySendError::Full(_)) => debug!(merged, "Event queue full, dropping event"),
            Err(chan::TrySendError::Closed(_)) => trace!("Event queue closed"),
        }
    }

    /// Replaces the watch handle. Returns when to retry if that failed.
    fn reopen(&mut self) -> Option<Instant> {
        drop(self.handle.take());
        match open_handle(&self.path, self.raw_tx.clone()) {
            Ok(handle) => {
                self.handle = Some(handle);
                info!("Watch re-registered");
                None
            }
            Err(err) => {
                let wait = Duration::from_millis(self.config.recovery_interval_ms);
                error!(
                    error = %err,
                    retry_in_ms = self.config.recovery_interval_ms,
                    "Watch re-registration failed"
                );
                Some(Instant::now() + wait)
            }
        }
    }
}
