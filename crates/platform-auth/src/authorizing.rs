//! Authorization-filtering store decorator.
//!
//! [`AuthorizingStore`] wraps any [`Store`] and consults an [`Authorizer`]
//! before delegating. Single-object operations are checked once against the
//! object's name. Collection operations are checked once at collection level
//! and then every returned item is re-checked with `get`, silently dropping
//! items the actor may not see.
//!
//! Capabilities are read from the wrapped store once, at construction. A
//! verb the wrapped store does not support fails with `MethodNotSupported`
//! without consulting the authorizer.

use async_trait::async_trait;
use platform_events::{WatchStream, DEFAULT_WATCH_BUFFER};
use platform_rbac::{AuthorizationRequest, Authorizer, Decision, ResourceType, Verb};
use platform_store::{
    Capabilities, ListOptions, Mutation, Payload, RequestContext, Resource, ResourceList, Store,
    StoreError, StoreResult,
};
use std::sync::Arc;
use tracing::debug;

use crate::filter::{can_get, filter_watch};

/// A [`Store`] that enforces authorization on every call.
pub struct AuthorizingStore<T> {
    inner: Arc<dyn Store<T>>,
    authorizer: Arc<dyn Authorizer>,
    resource: ResourceType,
    capabilities: Capabilities,
    watch_buffer: usize,
}

impl<T: Payload> AuthorizingStore<T> {
    /// Wrap `inner`, snapshotting its resource type and capabilities.
    pub fn new(inner: Arc<dyn Store<T>>, authorizer: Arc<dyn Authorizer>) -> Self {
        let resource = inner.resource();
        let capabilities = inner.capabilities();
        Self {
            inner,
            authorizer,
            resource,
            capabilities,
            watch_buffer: DEFAULT_WATCH_BUFFER,
        }
    }

    /// Buffer size of filtered watch streams.
    pub fn with_watch_buffer(mut self, watch_buffer: usize) -> Self {
        self.watch_buffer = watch_buffer;
        self
    }

    /// Check one request; deny becomes `Forbidden`, errors become `Internal`.
    async fn check(&self, ctx: &RequestContext, verb: Verb, name: Option<&str>) -> StoreResult<()> {
        let mut request = AuthorizationRequest::new(ctx.actor.clone(), verb, self.resource);
        if let Some(name) = name {
            request = request.with_name(name);
        }

        match self.authorizer.authorize(&request).await {
            Ok(Decision::Allow) => Ok(()),
            Ok(Decision::Deny(reason)) => {
                debug!(
                    actor = %ctx.actor,
                    verb = %verb,
                    coordinates = %request.coordinates,
                    request_id = %ctx.request_id,
                    reason = %reason,
                    "Request denied"
                );
                Err(StoreError::Forbidden(reason))
            }
            Err(e) => Err(StoreError::Internal(format!("authorizer failed: {}", e))),
        }
    }
}

impl<T> std::fmt::Debug for AuthorizingStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizingStore")
            .field("resource", &self.resource)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[async_trait]
impl<T: Payload> Store<T> for AuthorizingStore<T> {
    fn resource(&self) -> ResourceType {
        self.resource
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn get(&self, ctx: &RequestContext, name: &str) -> StoreResult<Resource<T>> {
        self.capabilities.require(Verb::Get)?;
        self.check(ctx, Verb::Get, Some(name)).await?;
        self.inner.get(ctx, name).await
    }

    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> StoreResult<ResourceList<T>> {
        self.capabilities.require(Verb::List)?;
        self.check(ctx, Verb::List, None).await?;

        let page = self.inner.list(ctx, options).await?;
        let total = page.items.len();
        let mut items = Vec::with_capacity(total);
        for item in page.items {
            if can_get(self.authorizer.as_ref(), &ctx.actor, self.resource, item.name()).await {
                items.push(item);
            }
        }

        if items.len() < total {
            debug!(
                actor = %ctx.actor,
                resource = %self.resource,
                dropped = total - items.len(),
                request_id = %ctx.request_id,
                "Filtered list items"
            );
        }

        Ok(ResourceList {
            items,
            continue_token: page.continue_token,
            version: page.version,
        })
    }

    async fn watch(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> StoreResult<WatchStream<Resource<T>>> {
        self.capabilities.require(Verb::Watch)?;
        self.check(ctx, Verb::Watch, None).await?;

        let upstream = self.inner.watch(ctx, options).await?;
        Ok(filter_watch(
            upstream,
            Arc::clone(&self.authorizer),
            ctx.actor.clone(),
            self.resource,
            self.watch_buffer,
        ))
    }

    async fn create(&self, ctx: &RequestContext, resource: Resource<T>) -> StoreResult<Resource<T>> {
        self.capabilities.require(Verb::Create)?;
        self.check(ctx, Verb::Create, Some(resource.name())).await?;
        self.inner.create(ctx, resource).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        mutate: Mutation<T>,
        allow_create: bool,
    ) -> StoreResult<(Resource<T>, bool)> {
        self.capabilities.require(Verb::Update)?;
        self.check(ctx, Verb::Update, Some(name)).await?;
        self.inner.update(ctx, name, mutate, allow_create).await
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> StoreResult<(Resource<T>, bool)> {
        self.capabilities.require(Verb::Delete)?;
        self.check(ctx, Verb::Delete, Some(name)).await?;
        self.inner.delete(ctx, name).await
    }
}
