//! Change bus implementation
//!
//! This module provides the in-process fan-out that feeds watches: every
//! write to a backing container publishes one event, and every subscriber
//! receives it on its own [`ChangeFeed`].

use crate::types::WatchEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Change feed error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The subscriber fell behind and missed events.
    #[error("Change feed lagged, {0} events dropped")]
    Lagged(u64),

    /// The bus was dropped.
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for change feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Change bus statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBusStats {
    /// Total events published
    pub events_published: u64,
    /// Active subscriptions
    pub active_subscriptions: usize,
}

/// In-memory broadcast bus for change events.
///
/// Capacity bounds how far a subscriber may fall behind before it starts
/// losing events; a lagging subscriber is told how many it missed.
pub struct ChangeBus<T> {
    sender: broadcast::Sender<WatchEvent<T>>,
    events_published: Arc<AtomicU64>,
    channel_capacity: usize,
}

impl<T> std::fmt::Debug for ChangeBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("channel_capacity", &self.channel_capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl<T: Clone + Send + 'static> ChangeBus<T> {
    /// Create a new change bus.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: Arc::new(AtomicU64::new(0)),
            channel_capacity: capacity.max(1),
        }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: WatchEvent<T>) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> ChangeFeed<T> {
        ChangeFeed {
            initial: VecDeque::new(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe, delivering `initial` events before any live event.
    ///
    /// Callers must hold whatever lock serializes publishing while building
    /// `initial` and subscribing, or events may be missed or duplicated.
    pub fn subscribe_with_initial(&self, initial: Vec<WatchEvent<T>>) -> ChangeFeed<T> {
        ChangeFeed {
            initial: initial.into(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Get bus statistics.
    pub fn stats(&self) -> ChangeBusStats {
        ChangeBusStats {
            events_published: self.events_published.load(Ordering::Relaxed),
            active_subscriptions: self.sender.receiver_count(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for ChangeBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of a [`ChangeBus`].
///
/// Dropping the feed unsubscribes it.
pub struct ChangeFeed<T> {
    initial: VecDeque<WatchEvent<T>>,
    receiver: broadcast::Receiver<WatchEvent<T>>,
}

impl<T: Clone> ChangeFeed<T> {
    /// Receive the next event.
    pub async fn recv(&mut self) -> FeedResult<WatchEvent<T>> {
        if let Some(event) = self.initial.pop_front() {
            return Ok(event);
        }
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => Err(FeedError::Lagged(missed)),
            Err(broadcast::error::RecvError::Closed) => Err(FeedError::ChannelClosed),
        }
    }
}
