//! Watch event types
//!
//! This module defines the events delivered on a resource watch. Object
//! events (`Added`, `Modified`, `Deleted`) carry a resource; `Error` and
//! `Bookmark` events are out-of-band and carry no resource identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Watch event type tags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// An object was created.
    Added,
    /// An object was changed.
    Modified,
    /// An object was removed.
    Deleted,
    /// The stream hit a problem; carries a [`Status`].
    Error,
    /// Progress marker (heartbeat) carrying only a version.
    Bookmark,
}

impl EventType {
    /// Get the wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Added => "ADDED",
            EventType::Modified => "MODIFIED",
            EventType::Deleted => "DELETED",
            EventType::Error => "ERROR",
            EventType::Bookmark => "BOOKMARK",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure description carried by `Error` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// HTTP-style status code.
    pub code: u16,

    /// Machine-readable reason (e.g. `INTERNAL_ERROR`, `EXPIRED`).
    pub reason: String,

    /// Human-readable message.
    pub message: String,
}

impl Status {
    /// Create a status.
    pub fn new(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// The watch fell too far behind the change feed and must be restarted.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(410, "EXPIRED", message)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.reason, self.message)
    }
}

/// A single event on a watch stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "object", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchEvent<T> {
    /// An object was created.
    Added(T),
    /// An object was changed.
    Modified(T),
    /// An object was removed; carries its last known state.
    Deleted(T),
    /// The stream hit a problem.
    Error(Status),
    /// Heartbeat carrying the latest version seen by the producer.
    Bookmark {
        /// Latest version token.
        version: String,
    },
}

impl<T> WatchEvent<T> {
    /// Get the event type tag.
    pub fn event_type(&self) -> EventType {
        match self {
            WatchEvent::Added(_) => EventType::Added,
            WatchEvent::Modified(_) => EventType::Modified,
            WatchEvent::Deleted(_) => EventType::Deleted,
            WatchEvent::Error(_) => EventType::Error,
            WatchEvent::Bookmark { .. } => EventType::Bookmark,
        }
    }

    /// Get the carried object, if this is an object event.
    pub fn object(&self) -> Option<&T> {
        match self {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) | WatchEvent::Deleted(obj) => Some(obj),
            WatchEvent::Error(_) | WatchEvent::Bookmark { .. } => None,
        }
    }

    /// Check if this event is out-of-band (carries no resource identity).
    pub fn is_out_of_band(&self) -> bool {
        self.object().is_none()
    }

    /// Convert the carried object, keeping the event type.
    ///
    /// Out-of-band events pass through untouched. If the conversion fails the
    /// error is returned so the caller can decide how to surface it.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<WatchEvent<U>, E> {
        Ok(match self {
            WatchEvent::Added(obj) => WatchEvent::Added(f(obj)?),
            WatchEvent::Modified(obj) => WatchEvent::Modified(f(obj)?),
            WatchEvent::Deleted(obj) => WatchEvent::Deleted(f(obj)?),
            WatchEvent::Error(status) => WatchEvent::Error(status),
            WatchEvent::Bookmark { version } => WatchEvent::Bookmark { version },
        })
    }
}
