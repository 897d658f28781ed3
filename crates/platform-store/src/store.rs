//! The abstract resource store contract.
//!
//! Plain stores, the authorization decorator and the provisioner all
//! implement [`Store`], so they compose by wrapping. Each implementation
//! declares up front which verbs it supports through [`Capabilities`];
//! every operation has a default body that returns
//! `MethodNotSupported`, which is the implementation used for any verb an
//! implementation leaves out.

use async_trait::async_trait;
use platform_events::WatchStream;
use platform_rbac::{Actor, ResourceType, Verb};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::resource::{ListOptions, Payload, Resource, ResourceList};

/// Per-request context carried through every store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Who the request is made on behalf of.
    pub actor: Actor,

    /// Correlation ID for logs.
    pub request_id: String,
}

impl RequestContext {
    /// Create a context with a fresh request ID.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            request_id: Uuid::now_v7().to_string(),
        }
    }

    /// Use a caller-provided request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// A static set of supported verbs.
///
/// # Examples
///
/// ```
/// use platform_rbac::Verb;
/// use platform_store::Capabilities;
///
/// let caps = Capabilities::READ_ONLY.with(Verb::Create);
/// assert!(caps.supports(Verb::Create));
/// assert!(!caps.supports(Verb::Delete));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No verbs.
    pub const NONE: Capabilities = Capabilities(0);

    /// `get`, `list` and `watch`.
    pub const READ_ONLY: Capabilities = Capabilities(0b000_0111);

    /// Every store verb.
    pub const ALL: Capabilities = Capabilities(0b011_1111);

    fn bit(verb: Verb) -> u8 {
        match verb {
            Verb::Get => 1 << 0,
            Verb::List => 1 << 1,
            Verb::Watch => 1 << 2,
            Verb::Create => 1 << 3,
            Verb::Update => 1 << 4,
            Verb::Delete => 1 << 5,
            Verb::All => 0,
        }
    }

    /// Combine two sets.
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// Add a verb.
    pub fn with(self, verb: Verb) -> Capabilities {
        Capabilities(self.0 | Self::bit(verb))
    }

    /// Remove a verb.
    pub fn without(self, verb: Verb) -> Capabilities {
        Capabilities(self.0 & !Self::bit(verb))
    }

    /// Keep only verbs supported by both sets.
    pub fn intersect(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 & other.0)
    }

    /// Check if a verb is supported. The wildcard verb is never supported.
    pub fn supports(&self, verb: Verb) -> bool {
        let bit = Self::bit(verb);
        bit != 0 && self.0 & bit == bit
    }

    /// Supported verbs, in canonical order.
    pub fn verbs(&self) -> Vec<Verb> {
        Verb::operations()
            .into_iter()
            .filter(|v| self.supports(*v))
            .collect()
    }

    /// Fail with `MethodNotSupported` unless `verb` is supported.
    pub fn require(&self, verb: Verb) -> StoreResult<()> {
        if self.supports(verb) {
            Ok(())
        } else {
            Err(StoreError::MethodNotSupported(verb))
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::ALL
    }
}

impl FromIterator<Verb> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Verb>>(iter: I) -> Self {
        iter.into_iter().fold(Capabilities::NONE, Capabilities::with)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.verbs()).finish()
    }
}

/// Computes a new payload from the current one.
///
/// Receives `None` only when the resource is missing and the caller asked
/// for create-on-update.
pub type Mutation<T> = Box<dyn FnOnce(Option<T>) -> StoreResult<T> + Send>;

/// Generic create/read/update/delete/watch contract over one resource type.
#[async_trait]
pub trait Store<T: Payload>: Send + Sync {
    /// The resource collection served by this store.
    fn resource(&self) -> ResourceType;

    /// Verbs this store implements, fixed for the store's lifetime.
    fn capabilities(&self) -> Capabilities;

    /// Read one resource.
    async fn get(&self, _ctx: &RequestContext, _name: &str) -> StoreResult<Resource<T>> {
        Err(StoreError::MethodNotSupported(Verb::Get))
    }

    /// Read a page of resources.
    async fn list(&self, _ctx: &RequestContext, _options: &ListOptions) -> StoreResult<ResourceList<T>> {
        Err(StoreError::MethodNotSupported(Verb::List))
    }

    /// Subscribe to changes.
    async fn watch(
        &self,
        _ctx: &RequestContext,
        _options: &ListOptions,
    ) -> StoreResult<WatchStream<Resource<T>>> {
        Err(StoreError::MethodNotSupported(Verb::Watch))
    }

    /// Create a resource, returning it with derived metadata.
    async fn create(&self, _ctx: &RequestContext, _resource: Resource<T>) -> StoreResult<Resource<T>> {
        Err(StoreError::MethodNotSupported(Verb::Create))
    }

    /// Apply `mutate` to a resource's payload.
    ///
    /// Returns the updated resource and whether it was newly created.
    async fn update(
        &self,
        _ctx: &RequestContext,
        _name: &str,
        _mutate: Mutation<T>,
        _allow_create: bool,
    ) -> StoreResult<(Resource<T>, bool)> {
        Err(StoreError::MethodNotSupported(Verb::Update))
    }

    /// Delete a resource.
    ///
    /// Returns its last known state and whether it was deleted.
    async fn delete(&self, _ctx: &RequestContext, _name: &str) -> StoreResult<(Resource<T>, bool)> {
        Err(StoreError::MethodNotSupported(Verb::Delete))
    }
}

#[async_trait]
impl<T: Payload, S: Store<T> + ?Sized> Store<T> for Arc<S> {
    fn resource(&self) -> ResourceType {
        (**self).resource()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    async fn get(&self, ctx: &RequestContext, name: &str) -> StoreResult<Resource<T>> {
        (**self).get(ctx, name).await
    }

    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> StoreResult<ResourceList<T>> {
        (**self).list(ctx, options).await
    }

    async fn watch(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> StoreResult<WatchStream<Resource<T>>> {
        (**self).watch(ctx, options).await
    }

    async fn create(&self, ctx: &RequestContext, resource: Resource<T>) -> StoreResult<Resource<T>> {
        (**self).create(ctx, resource).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        mutate: Mutation<T>,
        allow_create: bool,
    ) -> StoreResult<(Resource<T>, bool)> {
        (**self).update(ctx, name, mutate, allow_create).await
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> StoreResult<(Resource<T>, bool)> {
        (**self).delete(ctx, name).await
    }
}

/// Build a [`Mutation`] from a closure.
pub fn mutation<T, F>(f: F) -> Mutation<T>
where
    F: FnOnce(Option<T>) -> StoreResult<T> + Send + 'static,
{
    Box::new(f)
}
