//! # Platform Events
//!
//! This crate provides the watch plumbing for the Relay platform's
//! declarative resource API.
//!
//! ## Overview
//!
//! The platform-events crate handles:
//! - **Event Types**: `ADDED`/`MODIFIED`/`DELETED` object events plus
//!   out-of-band `ERROR` and `BOOKMARK` events
//! - **Change Bus**: In-process broadcast fan-out feeding every watch
//! - **Watch Streams**: Bounded, cancellable per-watch delivery
//!
//! ## Usage
//!
//! ### Publishing Changes
//!
//! ```rust,no_run
//! use platform_events::{ChangeBus, WatchEvent};
//!
//! async fn publish_example() {
//!     let bus = ChangeBus::new();
//!     let mut feed = bus.subscribe();
//!
//!     bus.publish(WatchEvent::Added("acme".to_string()));
//!
//!     let event = feed.recv().await.unwrap();
//!     assert_eq!(event.object().map(String::as_str), Some("acme"));
//! }
//! ```
//!
//! ### Consuming a Watch
//!
//! ```rust,no_run
//! use platform_events::{watch_channel, WatchEvent};
//!
//! async fn consume_example() {
//!     let (tx, mut stream) = watch_channel::<String>(16);
//!
//!     tokio::spawn(async move {
//!         tx.send(WatchEvent::Modified("acme".to_string())).await;
//!     });
//!
//!     while let Some(event) = stream.recv().await {
//!         println!("{}: {:?}", event.event_type(), event.object());
//!     }
//! }
//! ```

pub mod bus;
pub mod stream;
pub mod types;

// Re-export main types
pub use bus::{ChangeBus, ChangeBusStats, ChangeFeed, FeedError, FeedResult};
pub use stream::{watch_channel, WatchSender, WatchStream, DEFAULT_WATCH_BUFFER};
pub use types::{EventType, Status, WatchEvent};
