use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use platform_events::{ChangeBus, ChangeBusStats, ChangeFeed, WatchEvent};
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::container::{BlobContainer, BlobEntry, BlobList, ContainerError, ContainerResult};
use crate::resource::ListOptions;

#[derive(Debug, Default)]
struct ContainerState {
    entries: BTreeMap<String, BlobEntry>,
    revision: u64,
}

impl ContainerState {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }
}

/// In-memory, BTreeMap-based blob container.
///
/// Intended for tests and embedding. Versions are a single container-wide
/// revision counter; UIDs are fresh v7 UUIDs. Every write publishes to the
/// change bus while still holding the write lock, so watchers observe
/// writes in commit order.
pub struct MemoryBlobContainer {
    state: RwLock<ContainerState>,
    bus: ChangeBus<BlobEntry>,
}

impl MemoryBlobContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create an empty container whose change feed buffers `capacity` events
    /// per watcher.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(ContainerState::default()),
            bus: ChangeBus::with_capacity(capacity),
        }
    }

    /// Create an empty container sized by `config.change_feed_capacity`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::with_capacity(config.change_feed_capacity)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns `true` if the container is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Current container revision.
    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// Publish a heartbeat carrying the current revision to every watcher.
    pub async fn bookmark(&self) {
        let state = self.state.read().await;
        self.bus.publish(WatchEvent::Bookmark {
            version: state.revision.to_string(),
        });
    }

    /// Change bus statistics.
    pub fn feed_stats(&self) -> ChangeBusStats {
        self.bus.stats()
    }
}

impl Default for MemoryBlobContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBlobContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlobContainer")
            .field("bus", &self.bus)
            .finish()
    }
}

fn encode_token(last_name: &str) -> String {
    URL_SAFE_NO_PAD.encode(last_name.as_bytes())
}

fn decode_token(token: &str) -> ContainerResult<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| ContainerError::Invalid(format!("malformed continue token: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| ContainerError::Invalid("malformed continue token: not utf-8".to_string()))
}

#[async_trait]
impl BlobContainer for MemoryBlobContainer {
    async fn get(&self, name: &str) -> ContainerResult<BlobEntry> {
        let state = self.state.read().await;
        state
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))
    }

    async fn create(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry> {
        let mut state = self.state.write().await;
        if state.entries.contains_key(name) {
            return Err(ContainerError::AlreadyExists(name.to_string()));
        }

        let entry = BlobEntry {
            name: name.to_string(),
            bytes,
            uid: Uuid::now_v7().to_string(),
            creation_timestamp: Utc::now(),
            version: state.next_revision(),
        };
        state.entries.insert(entry.name.clone(), entry.clone());
        self.bus.publish(WatchEvent::Added(entry.clone()));
        Ok(entry)
    }

    async fn patch(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry> {
        let mut state = self.state.write().await;
        if !state.entries.contains_key(name) {
            return Err(ContainerError::NotFound(name.to_string()));
        }
        let version = state.next_revision();
        let entry = state
            .entries
            .get_mut(name)
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;

        entry.bytes = bytes;
        entry.version = version;
        let entry = entry.clone();
        self.bus.publish(WatchEvent::Modified(entry.clone()));
        Ok(entry)
    }

    async fn delete(&self, name: &str) -> ContainerResult<BlobEntry> {
        let mut state = self.state.write().await;
        let mut entry = state
            .entries
            .remove(name)
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;

        entry.version = state.next_revision();
        self.bus.publish(WatchEvent::Deleted(entry.clone()));
        Ok(entry)
    }

    async fn list(&self, options: &ListOptions) -> ContainerResult<BlobList> {
        let start = match &options.continue_token {
            Some(token) => Bound::Excluded(decode_token(token)?),
            None => Bound::Unbounded,
        };
        let limit = options.limit.filter(|l| *l > 0).unwrap_or(usize::MAX);

        let state = self.state.read().await;
        let mut remaining = state.entries.range((start, Bound::Unbounded));
        let items: Vec<BlobEntry> = remaining.by_ref().take(limit).map(|(_, e)| e.clone()).collect();
        let continue_token = match (remaining.next(), items.last()) {
            (Some(_), Some(last)) => Some(encode_token(&last.name)),
            _ => None,
        };

        Ok(BlobList {
            items,
            continue_token,
            version: state.revision.to_string(),
        })
    }

    async fn watch(&self, options: &ListOptions) -> ContainerResult<ChangeFeed<BlobEntry>> {
        // Writers publish under the write lock, so holding the read lock
        // makes the snapshot and the subscription one atomic step.
        let state = self.state.read().await;
        if options.send_initial_events {
            let initial = state
                .entries
                .values()
                .cloned()
                .map(WatchEvent::Added)
                .collect();
            Ok(self.bus.subscribe_with_initial(initial))
        } else {
            Ok(self.bus.subscribe())
        }
    }
}
