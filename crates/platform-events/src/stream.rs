//! Bounded watch streams
//!
//! A watch is delivered through a bounded channel: the producing task
//! blocks when the consumer falls `capacity` events behind, so a slow
//! consumer applies backpressure instead of growing memory. Closing or
//! dropping the [`WatchStream`] is the cancellation signal; the producer
//! observes it through [`WatchSender::closed`] or a failed send and stops.

use crate::types::WatchEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Default number of buffered events per watch.
pub const DEFAULT_WATCH_BUFFER: usize = 100;

/// Create a connected watch sender/stream pair.
///
/// A capacity of zero is raised to one.
pub fn watch_channel<T>(capacity: usize) -> (WatchSender<T>, WatchStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        WatchSender { sender: tx },
        WatchStream {
            id: uuid::Uuid::now_v7().to_string(),
            receiver: rx,
        },
    )
}

/// Producer half of a watch.
#[derive(Debug)]
pub struct WatchSender<T> {
    sender: mpsc::Sender<WatchEvent<T>>,
}

impl<T> Clone for WatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> WatchSender<T> {
    /// Send an event, waiting for buffer space.
    ///
    /// # Returns
    ///
    /// `false` if the consumer has gone away and the producer should stop.
    pub async fn send(&self, event: WatchEvent<T>) -> bool {
        self.sender.send(event).await.is_ok()
    }

    /// Resolves once the consumer has closed or dropped the stream.
    pub async fn closed(&self) {
        self.sender.closed().await
    }

    /// Check if the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer half of a watch.
#[derive(Debug)]
pub struct WatchStream<T> {
    /// Stream ID, for logging.
    pub id: String,
    receiver: mpsc::Receiver<WatchEvent<T>>,
}

impl<T> WatchStream<T> {
    /// Receive the next event.
    ///
    /// Returns `None` once the producer has finished or the stream was stopped
    /// and the buffer is drained.
    pub async fn recv(&mut self) -> Option<WatchEvent<T>> {
        self.receiver.recv().await
    }

    /// Stop the watch. Buffered events can still be drained with `recv`.
    pub fn stop(&mut self) {
        self.receiver.close();
    }
}

impl<T> Stream for WatchStream<T> {
    type Item = WatchEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
