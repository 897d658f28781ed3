//! Compensating provisioner
//!
//! [`ProvisioningStore`] wraps a store's create and delete paths with a list
//! of side effects: auxiliary objects created for each new resource and
//! removed with it. Side effects are applied one at a time, in order, after
//! the primary resource exists. If one fails, every side effect already
//! applied by that call is reverted in application order, then the primary
//! resource is deleted, and the triggering error is returned together with
//! any compensation failures. Nothing is retried. An update that creates
//! the resource provisions it the same way.

use async_trait::async_trait;
use platform_events::WatchStream;
use platform_rbac::ResourceType;
use platform_store::{
    Capabilities, ListOptions, MultiError, Mutation, Payload, RequestContext, Resource, ResourceList,
    Store, StoreError, StoreResult,
};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// An auxiliary object created alongside a resource.
#[async_trait]
pub trait SideEffect<T>: Send + Sync {
    /// Short label for logs.
    fn kind(&self) -> &'static str;

    /// Create the auxiliary object for `resource`.
    async fn apply(&self, ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()>;

    /// Remove the auxiliary object for `resource`.
    ///
    /// Must succeed when the object is already absent.
    async fn revert(&self, ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()>;
}

/// A [`Store`] whose creates and deletes carry side effects.
///
/// Reads pass straight through, as do updates of existing resources.
pub struct ProvisioningStore<T> {
    inner: Arc<dyn Store<T>>,
    effects: Vec<Arc<dyn SideEffect<T>>>,
}

impl<T: Payload> ProvisioningStore<T> {
    /// Wrap `inner` with no side effects.
    pub fn new(inner: Arc<dyn Store<T>>) -> Self {
        Self {
            inner,
            effects: Vec::new(),
        }
    }

    /// Append a side effect. Side effects apply in the order added.
    pub fn with_side_effect(mut self, effect: Arc<dyn SideEffect<T>>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Number of configured side effects.
    pub fn side_effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Apply every side effect to a freshly created resource.
    ///
    /// On failure the resource is compensated and no longer exists.
    async fn provision(&self, ctx: &RequestContext, created: &Resource<T>) -> StoreResult<()> {
        let mut applied: Vec<Arc<dyn SideEffect<T>>> = Vec::with_capacity(self.effects.len());
        for effect in &self.effects {
            match effect.apply(ctx, created).await {
                Ok(()) => applied.push(Arc::clone(effect)),
                Err(trigger) => {
                    warn!(
                        name = %created.name(),
                        side_effect = effect.kind(),
                        error = %trigger,
                        "Side effect failed, compensating"
                    );
                    return Err(self.compensate(ctx, created, &applied, trigger).await);
                }
            }
        }

        debug!(name = %created.name(), side_effects = applied.len(), "Resource provisioned");
        Ok(())
    }

    /// Undo a partially provisioned create.
    ///
    /// Always returns an error: `trigger`, or `trigger` aggregated with
    /// every compensation failure.
    async fn compensate(
        &self,
        ctx: &RequestContext,
        created: &Resource<T>,
        applied: &[Arc<dyn SideEffect<T>>],
        trigger: StoreError,
    ) -> StoreError {
        let mut failures = Vec::new();

        for effect in applied {
            if let Err(e) = effect.revert(ctx, created).await {
                error!(
                    resource = %self.inner.resource(),
                    name = %created.name(),
                    side_effect = effect.kind(),
                    error = %e,
                    "Failed to revert side effect"
                );
                failures.push(Some(e));
            }
        }

        if let Err(e) = self.inner.delete(ctx, created.name()).await {
            error!(
                resource = %self.inner.resource(),
                name = %created.name(),
                error = %e,
                "Failed to delete partially provisioned resource"
            );
            failures.push(Some(e));
        }

        let compensated = failures.is_empty();
        let combined = MultiError::aggregate(std::iter::once(Some(trigger)).chain(failures));
        match combined {
            Some(err) => {
                if compensated {
                    warn!(name = %created.name(), error = %err, "Provisioning rolled back");
                }
                err
            }
            None => StoreError::Internal(format!("provisioning of \"{}\" failed", created.name())),
        }
    }
}

impl<T> std::fmt::Debug for ProvisioningStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.effects.iter().map(|e| e.kind()).collect();
        f.debug_struct("ProvisioningStore")
            .field("side_effects", &kinds)
            .finish()
    }
}

#[async_trait]
impl<T: Payload> Store<T> for ProvisioningStore<T> {
    fn resource(&self) -> ResourceType {
        self.inner.resource()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    async fn get(&self, ctx: &RequestContext, name: &str) -> StoreResult<Resource<T>> {
        self.inner.get(ctx, name).await
    }

    async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> StoreResult<ResourceList<T>> {
        self.inner.list(ctx, options).await
    }

    async fn watch(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> StoreResult<WatchStream<Resource<T>>> {
        self.inner.watch(ctx, options).await
    }

    #[instrument(skip_all, fields(resource = %self.inner.resource(), request_id = %ctx.request_id))]
    async fn create(&self, ctx: &RequestContext, resource: Resource<T>) -> StoreResult<Resource<T>> {
        let created = self.inner.create(ctx, resource).await?;
        self.provision(ctx, &created).await?;
        Ok(created)
    }

    #[instrument(skip_all, fields(resource = %self.inner.resource(), name = %name, request_id = %ctx.request_id))]
    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        mutate: Mutation<T>,
        allow_create: bool,
    ) -> StoreResult<(Resource<T>, bool)> {
        let (resource, created) = self.inner.update(ctx, name, mutate, allow_create).await?;
        if created {
            self.provision(ctx, &resource).await?;
        }
        Ok((resource, created))
    }

    #[instrument(skip_all, fields(resource = %self.inner.resource(), name = %name, request_id = %ctx.request_id))]
    async fn delete(&self, ctx: &RequestContext, name: &str) -> StoreResult<(Resource<T>, bool)> {
        let (last_known, deleted) = self.inner.delete(ctx, name).await?;

        for effect in &self.effects {
            if let Err(e) = effect.revert(ctx, &last_known).await {
                warn!(side_effect = effect.kind(), error = %e, "Side effect cleanup failed");
            }
        }

        Ok((last_known, deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_rbac::{Actor, Verb};
    use platform_store::{mutation, BlobContainer, BlobStore, MemoryBlobContainer};
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    /// Records applied names in a shared set; optionally fails apply or revert.
    struct Marker {
        label: &'static str,
        applied: Arc<Mutex<HashSet<String>>>,
        fail_apply: bool,
        fail_revert: bool,
    }

    impl Marker {
        fn new(label: &'static str) -> Self {
            Self {
                label,
                applied: Arc::new(Mutex::new(HashSet::new())),
                fail_apply: false,
                fail_revert: false,
            }
        }

        fn failing_apply(mut self) -> Self {
            self.fail_apply = true;
            self
        }

        fn failing_revert(mut self) -> Self {
            self.fail_revert = true;
            self
        }

        async fn contains(&self, name: &str) -> bool {
            self.applied.lock().await.contains(name)
        }
    }

    #[async_trait]
    impl SideEffect<String> for Marker {
        fn kind(&self) -> &'static str {
            self.label
        }

        async fn apply(&self, _ctx: &RequestContext, resource: &Resource<String>) -> StoreResult<()> {
            if self.fail_apply {
                return Err(StoreError::Internal(format!("{} unavailable", self.label)));
            }
            self.applied.lock().await.insert(resource.name().to_string());
            Ok(())
        }

        async fn revert(&self, _ctx: &RequestContext, resource: &Resource<String>) -> StoreResult<()> {
            if self.fail_revert {
                return Err(StoreError::Internal(format!("{} revert failed", self.label)));
            }
            self.applied.lock().await.remove(resource.name());
            Ok(())
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Actor::new("alice"))
    }

    fn raw() -> Arc<BlobStore<String>> {
        Arc::new(BlobStore::new(
            ResourceType::Organization,
            Arc::new(MemoryBlobContainer::new()),
        ))
    }

    #[tokio::test]
    async fn test_create_applies_side_effects_in_order() {
        let first = Arc::new(Marker::new("first"));
        let second = Arc::new(Marker::new("second"));
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second.clone());

        let created = store.create(&ctx(), Resource::new("foo", "x".to_string())).await.unwrap();
        assert_eq!(created.payload, "x");
        assert!(first.contains("foo").await);
        assert!(second.contains("foo").await);
        assert_eq!(store.side_effect_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_side_effect_rolls_back_everything() {
        let first = Arc::new(Marker::new("first"));
        let second = Arc::new(Marker::new("second").failing_apply());
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second);

        let err = store
            .create(&ctx(), Resource::new("bar", "x".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Internal error: second unavailable");
        assert!(!first.contains("bar").await);
        assert!(store.get(&ctx(), "bar").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_upsert_create_applies_side_effects() {
        let first = Arc::new(Marker::new("first"));
        let second = Arc::new(Marker::new("second"));
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second.clone());

        let (upserted, created) = store
            .update(&ctx(), "foo", mutation(|_| Ok("x".to_string())), true)
            .await
            .unwrap();
        assert!(created);
        assert_eq!(upserted.payload, "x");
        assert!(first.contains("foo").await);
        assert!(second.contains("foo").await);
    }

    #[tokio::test]
    async fn test_upsert_create_rolls_back_on_failed_side_effect() {
        let first = Arc::new(Marker::new("first"));
        let second = Arc::new(Marker::new("second").failing_apply());
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second);

        let err = store
            .update(&ctx(), "bar", mutation(|_| Ok("x".to_string())), true)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Internal error: second unavailable");
        assert!(!first.contains("bar").await);
        assert!(store.get(&ctx(), "bar").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_of_existing_skips_side_effects() {
        let first = Arc::new(Marker::new("first"));
        let store = ProvisioningStore::new(raw()).with_side_effect(first.clone());
        store.create(&ctx(), Resource::new("foo", "x".to_string())).await.unwrap();
        first.applied.lock().await.clear();

        let (updated, created) = store
            .update(&ctx(), "foo", mutation(|_| Ok("y".to_string())), true)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(updated.payload, "y");
        assert!(!first.contains("foo").await);
    }

    #[tokio::test]
    async fn test_compensation_failure_is_aggregated() {
        let first = Arc::new(Marker::new("first").failing_revert());
        let second = Arc::new(Marker::new("second").failing_apply());
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second);

        let err = store
            .create(&ctx(), Resource::new("bar", "x".to_string()))
            .await
            .unwrap_err();

        match &err {
            StoreError::Aggregate(multi) => {
                assert_eq!(multi.len(), 2);
                assert_eq!(multi.errors()[0].to_string(), "Internal error: second unavailable");
                assert_eq!(multi.errors()[1].to_string(), "Internal error: first revert failed");
            }
            other => panic!("expected aggregate, got {:?}", other),
        }
        // Residual side effect remains, the primary is still removed.
        assert!(first.contains("bar").await);
        assert!(store.get(&ctx(), "bar").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_primary_create_failure_skips_side_effects() {
        let first = Arc::new(Marker::new("first"));
        let store = ProvisioningStore::new(raw()).with_side_effect(first.clone());
        store.create(&ctx(), Resource::new("foo", "x".to_string())).await.unwrap();
        first.applied.lock().await.clear();

        let err = store
            .create(&ctx(), Resource::new("foo", "y".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert!(!first.contains("foo").await);
        assert_eq!(store.get(&ctx(), "foo").await.unwrap().payload, "x");
    }

    #[tokio::test]
    async fn test_delete_reverts_side_effects_best_effort() {
        let first = Arc::new(Marker::new("first").failing_revert());
        let second = Arc::new(Marker::new("second"));
        let store = ProvisioningStore::new(raw())
            .with_side_effect(first.clone())
            .with_side_effect(second.clone());
        store.create(&ctx(), Resource::new("foo", "x".to_string())).await.unwrap();

        let (last, deleted) = store.delete(&ctx(), "foo").await.unwrap();
        assert!(deleted);
        assert_eq!(last.payload, "x");
        assert!(first.contains("foo").await);
        assert!(!second.contains("foo").await);
    }

    #[tokio::test]
    async fn test_undecodable_primary_keeps_side_effects() {
        let container = Arc::new(MemoryBlobContainer::new());
        let first = Arc::new(Marker::new("first"));
        let second = Arc::new(Marker::new("second"));
        let store = ProvisioningStore::new(Arc::new(BlobStore::<String>::new(
            ResourceType::Organization,
            container.clone(),
        )))
        .with_side_effect(first.clone())
        .with_side_effect(second.clone());
        store.create(&ctx(), Resource::new("acme", "x".to_string())).await.unwrap();
        container.patch("acme", b"not json".to_vec()).await.unwrap();

        let err = store.delete(&ctx(), "acme").await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));

        // Nothing was removed, so nothing is orphaned.
        assert!(container.get("acme").await.is_ok());
        assert!(first.contains("acme").await);
        assert!(second.contains("acme").await);
    }

    #[tokio::test]
    async fn test_delete_missing_primary_fails() {
        let store = ProvisioningStore::new(raw()).with_side_effect(Arc::new(Marker::new("first")));
        assert!(store.delete(&ctx(), "ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_passes_capabilities_through() {
        let inner = Arc::new(
            BlobStore::<String>::new(ResourceType::Invitation, Arc::new(MemoryBlobContainer::new()))
                .with_capabilities(Capabilities::ALL.without(Verb::Watch)),
        );
        let store = ProvisioningStore::new(inner);
        assert_eq!(store.resource(), ResourceType::Invitation);
        assert!(!store.capabilities().supports(Verb::Watch));
    }
}
