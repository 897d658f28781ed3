//! Resource domain models
//!
//! A resource is a named, versioned record: identity metadata plus an opaque
//! payload. Only `name` (or `generate_name`) is chosen by callers; `uid`,
//! `creation_timestamp` and `version` are always derived by the store.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bound for anything storable as a resource payload.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Identity metadata of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Unique, immutable name. The sole addressing key.
    pub name: String,

    /// Name prefix used when `name` is empty; the store appends a random suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,

    /// Stable identifier, never reused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,

    /// When the resource was first stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Opaque token that changes on every successful write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A named, versioned resource.
///
/// # Examples
///
/// ```
/// use platform_store::Resource;
///
/// let resource = Resource::new("acme", "payload".to_string());
/// assert_eq!(resource.name(), "acme");
/// assert!(resource.metadata.uid.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<T> {
    /// Identity metadata.
    pub metadata: ObjectMeta,

    /// Resource-specific content.
    pub payload: T,
}

impl<T> Resource<T> {
    /// Creates a resource with an explicit name.
    pub fn new(name: impl Into<String>, payload: T) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            payload,
        }
    }

    /// Creates a resource whose name the store generates from `prefix`.
    pub fn generated(prefix: impl Into<String>, payload: T) -> Self {
        Self {
            metadata: ObjectMeta {
                generate_name: Some(prefix.into()),
                ..ObjectMeta::default()
            },
            payload,
        }
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The version token, once stored.
    pub fn version(&self) -> Option<&str> {
        self.metadata.version.as_deref()
    }
}

/// Paging options for list and watch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Maximum number of items per page. `None` or zero means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Token from a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,

    /// Watch only: replay existing objects as `Added` events first.
    #[serde(default)]
    pub send_initial_events: bool,
}

impl ListOptions {
    /// Options for one page of at most `limit` items.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Continue from a previous page.
    pub fn continuing(mut self, token: impl Into<String>) -> Self {
        self.continue_token = Some(token.into());
        self
    }

    /// Watch only: replay existing objects first.
    pub fn with_initial_events(mut self) -> Self {
        self.send_initial_events = true;
        self
    }
}

/// One page of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    /// The items on this page, ordered by name.
    pub items: Vec<Resource<T>>,

    /// Token for the next page, if there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,

    /// Collection version at the time of the read.
    pub version: String,
}

impl<T> ResourceList<T> {
    /// Names of the items on this page.
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(Resource::name).collect()
    }
}
