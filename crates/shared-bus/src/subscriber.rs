//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{BlockchainEvent, EventFilter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for anything that hands out subscriptions.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

impl EventSubscriber for crate::publisher::InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        crate::publisher::InMemoryEventBus::subscribe(self, filter)
    }
}

/// Live subscription counts keyed by filter.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    counts: Mutex<HashMap<String, usize>>,
}

impl SubscriptionRegistry {
    fn key(filter: &EventFilter) -> String {
        format!("{:?}/{:?}", filter.topics, filter.source_subsystems)
    }

    fn register(&self, filter: &EventFilter) {
        *self.counts.lock().entry(Self::key(filter)).or_insert(0) += 1;
    }

    fn release(&self, filter: &EventFilter) {
        let key = Self::key(filter);
        let mut counts = self.counts.lock();
        if let Some(count) = counts.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(&key);
            }
        }
    }

    /// Live subscriptions created with `filter`.
    #[must_use]
    pub fn count(&self, filter: &EventFilter) -> usize {
        self.counts
            .lock()
            .get(&Self::key(filter))
            .copied()
            .unwrap_or(0)
    }
}

/// A subscription handle for receiving events.
///
/// When dropped, the subscription is removed from the registry.
pub struct Subscription {
    receiver: broadcast::Receiver<BlockchainEvent>,
    filter: EventFilter,
    registry: Arc<SubscriptionRegistry>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<BlockchainEvent>,
        filter: EventFilter,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        registry.register(&filter);
        Self {
            receiver,
            filter,
            registry,
        }
    }

    /// Receive the next event that matches the filter.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<BlockchainEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    ///
    /// `Ok(None)` means nothing is queued right now.
    pub fn try_recv(&mut self) -> Result<Option<BlockchainEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(&self.filter);
        debug!(topics = ?self.filter.topics, "Subscription dropped");
    }
}

/// A filtered `Stream` over bus events.
pub struct EventStream {
    inner: BroadcastStream<BlockchainEvent>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<BlockchainEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = BlockchainEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if this.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    warn!(lagged = count, "Event stream lagged, events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
