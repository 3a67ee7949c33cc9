//! Event Module
//!
//! This module provides the lifecycle event vocabulary and the `Notifier`
//! seam shared by every event producer in Muster.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ SourceWatcher │────>│ EventMultiplexer │────>│  reconciler  │
//! │  (one path)   │     │ (one per service)│     │  (external)  │
//! └───────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! Delivery is best-effort: producers push with `try_send` and drop events
//! when a consumer falls behind. Consumers must reconcile idempotently.

pub mod message;

pub use message::{Event, EventKind, ServiceRef};

use crate::error::Result;
use futures::stream::BoxStream;

/// Default capacity of bounded event queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// A stream of lifecycle events. Ends when the producer is closed.
pub type EventStream = BoxStream<'static, Event>;

/// Anything that produces lifecycle events.
///
/// `notify` and `close` never block: they are cheap state transitions that
/// may be called concurrently from any task.
pub trait Notifier: Send + Sync {
    /// Name of this notifier, used in logs
    fn name(&self) -> &str;

    /// Returns the event stream, starting the producer on first call.
    ///
    /// Fails with `MusterError::Closed` once `close` has been called.
    fn notify(&self) -> Result<EventStream>;

    /// Stops the producer. Idempotent.
    fn close(&self) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn notify(&self) -> Result<EventStream> {
        (**self).notify()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MusterError;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct OneShot {
        closed: AtomicBool,
    }

    impl Notifier for OneShot {
        fn name(&self) -> &str {
            "oneshot"
        }

        fn notify(&self) -> Result<EventStream> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(MusterError::Closed);
            }
            let ev = Event::update(ServiceRef::new("a"));
            Ok(futures::stream::iter(vec![ev]).boxed())
        }

        fn close(&self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_arc_notifier_delegates() {
        let inner = Arc::new(OneShot {
            closed: AtomicBool::new(false),
        });
        let shared: Arc<OneShot> = Arc::clone(&inner);

        assert_eq!(Notifier::name(&shared), "oneshot");
        let mut stream = shared.notify().unwrap();
        assert_eq!(stream.next().await.unwrap().service.name, "a");

        Notifier::close(&shared).unwrap();
        assert!(matches!(inner.notify(), Err(MusterError::Closed)));
    }
}
