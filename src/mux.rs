//! Event multiplexer
//!
//! Turns every upstream event into one derived event per managed service,
//! so a single change signal invalidates a whole fleet. No per-service
//! filtering happens here.
//!
//! Fan-out runs inside the consumer's read loop (`poll_next`); the
//! multiplexer owns no task. All derived events for one upstream event are
//! yielded, in managed-set order, before the next upstream event is read.

use futures::stream::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

use crate::error::Result;
use crate::event::{Event, EventStream, Notifier, DEFAULT_QUEUE_CAPACITY};

/// Ordered, immutable list of service names reconciled together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedSet {
    names: Vec<String>,
}

impl ManagedSet {
    /// Creates a managed set; order is preserved.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Names in configured order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Wraps an upstream notifier and fans its events out over a managed set.
pub struct EventMultiplexer<N> {
    upstream: N,
    managed: ManagedSet,
    capacity: usize,
    name: String,
}

impl<N: Notifier> EventMultiplexer<N> {
    pub fn new(upstream: N, managed: ManagedSet) -> Self {
        Self::with_capacity(upstream, managed, DEFAULT_QUEUE_CAPACITY)
    }

    /// `capacity` bounds how many derived events may wait for the consumer;
    /// derived events beyond it are dropped.
    pub fn with_capacity(upstream: N, managed: ManagedSet, capacity: usize) -> Self {
        let name = format!("mux({})", upstream.name());
        Self {
            upstream,
            managed,
            capacity: capacity.max(1),
            name,
        }
    }

    pub fn managed(&self) -> &ManagedSet {
        &self.managed
    }

    pub fn upstream(&self) -> &N {
        &self.upstream
    }
}

impl<N: Notifier> Notifier for EventMultiplexer<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self) -> Result<EventStream> {
        let upstream = self.upstream.notify()?;
        Ok(Box::pin(FanOut {
            upstream,
            managed: self.managed.clone(),
            pending: VecDeque::with_capacity(self.capacity),
            capacity: self.capacity,
        }))
    }

    fn close(&self) -> Result<()> {
        self.upstream.close()
    }
}

/// Stream adapter performing the fan-out.
struct FanOut {
    upstream: EventStream,
    managed: ManagedSet,
    pending: VecDeque<Event>,
    capacity: usize,
}

impl FanOut {
    fn expand(&mut self, event: &Event) {
        let mut dropped = 0usize;
        for name in self.managed.names() {
            if self.pending.len() >= self.capacity {
                dropped += 1;
                continue;
            }
            self.pending.push_back(event.derive_for(name));
        }
        if dropped > 0 {
            debug!(
                dropped,
                upstream = %event.service,
                "Fan-out buffer full, dropping derived events"
            );
        }
    }
}

impl Stream for FanOut {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        let this = self.get_mut();
        loop {
            if let Some(next) = this.pending.pop_front() {
                return Poll::Ready(Some(next));
            }
            match this.upstream.as_mut().poll_next(cx) {
                Poll::Ready(Some(event)) => this.expand(&event),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
