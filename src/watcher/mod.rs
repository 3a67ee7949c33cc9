//! Source watcher
//!
//! Observes the directory holding a service's source and emits coalesced
//! `Update` events when anything under it changes.
//!
//! The watch handle is created (and the path registered) at construction so
//! an unwatchable path fails fast. The background task is started lazily by
//! the first `notify` call and owns the handle from then on; watch errors are
//! recovered inside the task by replacing the handle wholesale.

mod task;

use async_channel as chan;
use futures::StreamExt;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use crate::config::WatcherConfig;
use crate::error::{MusterError, Result};
use crate::event::{Event, EventStream, Notifier, ServiceRef};

use task::WatchTask;

/// Capacity of the queue between the OS watch callback and the watch task.
const RAW_QUEUE_CAPACITY: usize = 256;

/// Notification as delivered by the OS watch mechanism.
pub(crate) type RawNotification = notify::Result<notify::Event>;

/// Creates a watch handle for `path` that forwards notifications into `raw_tx`.
///
/// The callback never blocks the OS watcher thread: notifications that do
/// not fit are dropped.
pub(crate) fn open_handle(
    path: &Path,
    raw_tx: chan::Sender<RawNotification>,
) -> notify::Result<RecommendedWatcher> {
    let mut handle = RecommendedWatcher::new(
        move |result: RawNotification| {
            let _ = raw_tx.try_send(result);
        },
        notify::Config::default(),
    )?;
    handle.watch(path, RecursiveMode::Recursive)?;
    Ok(handle)
}

/// Mutable lifecycle state, guarded by one lock.
#[derive(Default)]
struct Session {
    started: bool,
    closed: bool,
    /// Held here until the task starts, then moved into it
    handle: Option<RecommendedWatcher>,
    raw_rx: Option<chan::Receiver<RawNotification>>,
    task: Option<JoinHandle<()>>,
}

/// Watches one service's source directory.
pub struct SourceWatcher {
    service: ServiceRef,
    path: PathBuf,
    config: WatcherConfig,
    raw_tx: chan::Sender<RawNotification>,
    events_tx: chan::Sender<Event>,
    events_rx: chan::Receiver<Event>,
    stop_tx: chan::Sender<()>,
    stop_rx: chan::Receiver<()>,
    session: Mutex<Session>,
}

impl SourceWatcher {
    /// Creates a watcher for `path` on behalf of `service`.
    ///
    /// # Errors
    /// Returns `MusterError::WatchInit` if the path cannot be watched.
    pub fn new(
        service: ServiceRef,
        path: impl Into<PathBuf>,
        config: &WatcherConfig,
    ) -> Result<Self> {
        let path = path.into();
        let (raw_tx, raw_rx) = chan::bounded(RAW_QUEUE_CAPACITY);
        let (events_tx, events_rx) = chan::bounded(config.queue_capacity.max(1));
        let (stop_tx, stop_rx) = chan::bounded(1);

        let handle = open_handle(&path, raw_tx.clone())
            .map_err(|e| MusterError::WatchInit(format!("{}: {}", path.display(), e)))?;

        debug!(service = %service, path = %path.display(), "Source watch registered");

        Ok(Self {
            service,
            path,
            config: config.clone(),
            raw_tx,
            events_tx,
            events_rx,
            stop_tx,
            stop_rx,
            session: Mutex::new(Session {
                handle: Some(handle),
                raw_rx: Some(raw_rx),
                ..Default::default()
            }),
        })
    }

    /// Creates a watcher with default tuning.
    pub fn with_defaults(service: ServiceRef, path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(service, path, &WatcherConfig::default())
    }

    /// The watched directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The service events are emitted for
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    /// Whether the background task has been started and not yet closed.
    pub fn is_running(&self) -> bool {
        let session = self.lock();
        session.started && !session.closed
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // State transitions are single assignments; a poisoned lock still holds consistent flags.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn inject(&self, raw: RawNotification) -> bool {
        self.raw_tx.try_send(raw).is_ok()
    }
}

impl Notifier for SourceWatcher {
    fn name(&self) -> &str {
        &self.service.name
    }

    fn notify(&self) -> Result<EventStream> {
        let mut session = self.lock();
        if session.closed {
            return Err(MusterError::Closed);
        }

        if !session.started {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| MusterError::Runtime(e.to_string()))?;
            let raw_rx = session
                .raw_rx
                .take()
                .ok_or_else(|| MusterError::Runtime("watch queue already consumed".into()))?;

            let task = WatchTask {
                service: self.service.clone(),
                path: self.path.clone(),
                config: self.config.clone(),
                handle: session.handle.take(),
                raw_tx: self.raw_tx.clone(),
                raw_rx,
                events_tx: self.events_tx.clone(),
                stop_rx: self.stop_rx.clone(),
            };
            let span = info_span!(
                "source_watcher",
                service = %self.service,
                path = %self.path.display()
            );
            session.task = Some(runtime.spawn(task.run().instrument(span)));
            session.started = true;
        }

        Ok(self.events_rx.clone().boxed())
    }

    fn close(&self) -> Result<()> {
        let mut session = self.lock();
        if session.closed {
            return Ok(());
        }
        session.closed = true;

        // The task (if any) drops its handle on its way out.
        self.stop_tx.close();
        self.events_tx.close();
        drop(session.handle.take());
        drop(session.task.take());

        debug!(service = %self.service, "Source watcher closed");
        Ok(())
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
