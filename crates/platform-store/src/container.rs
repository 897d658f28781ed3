//! Backing blob container contract
//!
//! The generic store is written against this minimal key-value contract so
//! it can back onto anything offering named opaque blobs with container
//! managed metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use platform_events::ChangeFeed;
use thiserror::Error;

use crate::resource::ListOptions;

/// Physical representation of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Key, equal to the resource name.
    pub name: String,

    /// Encoded payload.
    pub bytes: Vec<u8>,

    /// Container-assigned identifier. May be recycled by the container.
    pub uid: String,

    /// When the container first stored the entry.
    pub creation_timestamp: DateTime<Utc>,

    /// Container version token, changed on every write.
    pub version: String,
}

/// One page of blob entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobList {
    /// Entries ordered by name.
    pub items: Vec<BlobEntry>,

    /// Token for the next page.
    pub continue_token: Option<String>,

    /// Container version at the time of the read.
    pub version: String,
}

/// Container error types.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No entry with this key.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// An entry with this key already exists.
    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    /// The request was rejected by the container (e.g. bad continue token).
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// The container could not be reached.
    #[error("Container unavailable: {0}")]
    Unavailable(String),
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// A key-value container of opaque blobs with change notifications.
#[async_trait]
pub trait BlobContainer: Send + Sync {
    /// Read one entry.
    async fn get(&self, name: &str) -> ContainerResult<BlobEntry>;

    /// Store a new entry. Fails with `AlreadyExists` if the key is taken.
    async fn create(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry>;

    /// Merge-patch an entry: replaces only its bytes, leaving container
    /// managed fields to the container.
    async fn patch(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry>;

    /// Remove an entry, returning its last state.
    async fn delete(&self, name: &str) -> ContainerResult<BlobEntry>;

    /// Read a page of entries.
    async fn list(&self, options: &ListOptions) -> ContainerResult<BlobList>;

    /// Subscribe to changes.
    async fn watch(&self, options: &ListOptions) -> ContainerResult<ChangeFeed<BlobEntry>>;
}
