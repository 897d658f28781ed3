//! Generic resource store backed by a blob container.
//!
//! Each resource is exactly one [`BlobEntry`]: the payload is encoded into
//! the entry's bytes and every piece of identity metadata is derived from
//! the entry's container-managed fields on read. Nothing else is persisted,
//! so a resource's metadata can never drift from its storage.

use async_trait::async_trait;
use platform_events::{watch_channel, FeedError, Status, WatchEvent, WatchStream};
use platform_rbac::{ResourceType, Verb};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::codec::{Codec, JsonCodec};
use crate::config::StoreConfig;
use crate::container::{BlobContainer, BlobEntry, ContainerError};
use crate::error::{StoreError, StoreResult};
use crate::identity::derive_uid;
use crate::names::{generate_name, validate_name};
use crate::resource::{ListOptions, ObjectMeta, Payload, Resource, ResourceList};
use crate::store::{Capabilities, Mutation, RequestContext, Store};

/// A [`Store`] over one resource type, persisted in a [`BlobContainer`].
///
/// Updates are merge patches of the bytes field with no version
/// precondition: concurrent updates to one name resolve last-write-wins.
pub struct BlobStore<T> {
    resource: ResourceType,
    container: Arc<dyn BlobContainer>,
    codec: Arc<dyn Codec<T>>,
    config: StoreConfig,
    capabilities: Capabilities,
}

impl<T: Payload> BlobStore<T> {
    /// Create a store with the JSON codec and default configuration.
    pub fn new(resource: ResourceType, container: Arc<dyn BlobContainer>) -> Self {
        Self {
            resource,
            container,
            codec: Arc::new(JsonCodec::new()),
            config: StoreConfig::default(),
            capabilities: Capabilities::ALL,
        }
    }

    /// Use a different payload codec.
    pub fn with_codec(mut self, codec: Arc<dyn Codec<T>>) -> Self {
        self.codec = codec;
        self
    }

    /// Use a different configuration.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Narrow the verbs this store exposes.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Capabilities::ALL.intersect(capabilities);
        self
    }

    fn map_error(&self, err: ContainerError) -> StoreError {
        map_container_error(self.resource, err)
    }

    fn decode(&self, entry: BlobEntry) -> StoreResult<Resource<T>> {
        decode_entry(self.codec.as_ref(), self.resource, entry)
    }

    fn encode(&self, payload: &T) -> StoreResult<Vec<u8>> {
        self.codec
            .encode(payload)
            .map_err(|e| StoreError::Internal(format!("encoding {}: {}", self.resource, e)))
    }

    async fn create_entry(&self, name: &str, payload: &T) -> StoreResult<Resource<T>> {
        let bytes = self.encode(payload)?;
        let entry = self
            .container
            .create(name, bytes)
            .await
            .map_err(|e| self.map_error(e))?;
        self.decode(entry)
    }
}

impl<T> std::fmt::Debug for BlobStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("resource", &self.resource)
            .field("capabilities", &self.capabilities)
            .field("content_type", &self.codec.content_type())
            .finish()
    }
}

/// Convert a container error into the store's typed error.
pub fn map_container_error(resource: ResourceType, err: ContainerError) -> StoreError {
    match err {
        ContainerError::NotFound(name) => StoreError::not_found(resource, name),
        ContainerError::AlreadyExists(name) => StoreError::already_exists(resource, name),
        ContainerError::Invalid(msg) => StoreError::ValidationFailed(msg),
        ContainerError::Unavailable(msg) => StoreError::Internal(msg),
    }
}

fn decode_entry<T>(
    codec: &dyn Codec<T>,
    resource: ResourceType,
    entry: BlobEntry,
) -> StoreResult<Resource<T>> {
    let payload = codec.decode(&entry.bytes).map_err(|e| {
        StoreError::Internal(format!("decoding {} \"{}\": {}", resource, entry.name, e))
    })?;

    Ok(Resource {
        metadata: ObjectMeta {
            uid: Some(derive_uid(&entry.uid)),
            creation_timestamp: Some(entry.creation_timestamp),
            version: Some(entry.version),
            generate_name: None,
            name: entry.name,
        },
        payload,
    })
}

#[async_trait]
impl<T: Payload> Store<T> for BlobStore<T> {
    fn resource(&self) -> ResourceType {
        self.resource
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn get(&self, _ctx: &RequestContext, name: &str) -> StoreResult<Resource<T>> {
        self.capabilities.require(Verb::Get)?;

        let entry = self.container.get(name).await.map_err(|e| self.map_error(e))?;
        self.decode(entry)
    }

    async fn list(&self, _ctx: &RequestContext, options: &ListOptions) -> StoreResult<ResourceList<T>> {
        self.capabilities.require(Verb::List)?;

        let options = ListOptions {
            limit: Some(self.config.page_size(options.limit)),
            ..options.clone()
        };
        let page = self.container.list(&options).await.map_err(|e| self.map_error(e))?;

        // One undecodable entry fails the whole page.
        let items = page
            .items
            .into_iter()
            .map(|entry| self.decode(entry))
            .collect::<StoreResult<Vec<_>>>()?;

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

        let mut feed = self.container.watch(options).await.map_err(|e| self.map_error(e))?;
        let (tx, stream) = watch_channel(self.config.watch_buffer_size);

        let codec = Arc::clone(&self.codec);
        let resource = self.resource;
        let watch_id = stream.id.clone();
        debug!(resource = %resource, watch_id = %watch_id, request_id = %ctx.request_id, "Watch started");

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = tx.closed() => break,
                    next = feed.recv() => next,
                };

                let event = match next {
                    Ok(event) => event,
                    Err(FeedError::Lagged(missed)) => {
                        warn!(resource = %resource, watch_id = %watch_id, missed, "Watch consumer fell behind");
                        let status = Status::expired(format!(
                            "watch of {} fell behind by {} events",
                            resource, missed
                        ));
                        tx.send(WatchEvent::Error(status)).await;
                        break;
                    }
                    Err(FeedError::ChannelClosed) => break,
                };

                let event = match event.try_map(|entry| decode_entry(codec.as_ref(), resource, entry)) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(resource = %resource, watch_id = %watch_id, error = %err, "Undecodable watch event");
                        WatchEvent::Error(err.to_status())
                    }
                };

                if !tx.send(event).await {
                    break;
                }
            }
            debug!(resource = %resource, watch_id = %watch_id, "Watch stopped");
        });

        Ok(stream)
    }

    async fn create(&self, ctx: &RequestContext, resource: Resource<T>) -> StoreResult<Resource<T>> {
        self.capabilities.require(Verb::Create)?;

        let name = match (resource.metadata.name.is_empty(), &resource.metadata.generate_name) {
            (true, Some(prefix)) => generate_name(prefix),
            _ => resource.metadata.name.clone(),
        };
        validate_name(&name)?;

        let created = self.create_entry(&name, &resource.payload).await?;
        debug!(
            resource = %self.resource,
            name = %created.name(),
            request_id = %ctx.request_id,
            "Resource created"
        );
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        name: &str,
        mutate: Mutation<T>,
        allow_create: bool,
    ) -> StoreResult<(Resource<T>, bool)> {
        self.capabilities.require(Verb::Update)?;

        let current = match self.container.get(name).await {
            Ok(entry) => Some(self.decode(entry)?),
            Err(ContainerError::NotFound(_)) => None,
            Err(e) => return Err(self.map_error(e)),
        };

        let (resource, created) = match current {
            Some(old) => {
                let payload = mutate(Some(old.payload))?;
                let bytes = self.encode(&payload)?;
                let entry = self
                    .container
                    .patch(name, bytes)
                    .await
                    .map_err(|e| self.map_error(e))?;
                (self.decode(entry)?, false)
            }
            None if allow_create => {
                validate_name(name)?;
                let payload = mutate(None)?;
                (self.create_entry(name, &payload).await?, true)
            }
            None => return Err(StoreError::not_found(self.resource, name)),
        };

        debug!(
            resource = %self.resource,
            name = %name,
            created,
            version = ?resource.version(),
            request_id = %ctx.request_id,
            "Resource updated"
        );
        Ok((resource, created))
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> StoreResult<(Resource<T>, bool)> {
        self.capabilities.require(Verb::Delete)?;

        // Decode before removing so an unreadable entry is never half-deleted.
        let entry = self.container.get(name).await.map_err(|e| self.map_error(e))?;
        let last_known = self.decode(entry)?;
        self.container.delete(name).await.map_err(|e| self.map_error(e))?;
        debug!(resource = %self.resource, name = %name, request_id = %ctx.request_id, "Resource deleted");
        Ok((last_known, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{BlobList, ContainerResult};
    use crate::memory::MemoryBlobContainer;
    use crate::store::mutation;
    use platform_events::EventType;
    use platform_rbac::Actor;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Org {
        display_name: String,
    }

    fn org(display_name: &str) -> Org {
        Org {
            display_name: display_name.to_string(),
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Actor::new("alice"))
    }

    fn setup() -> (Arc<MemoryBlobContainer>, BlobStore<Org>) {
        let container = Arc::new(MemoryBlobContainer::new());
        let store = BlobStore::new(ResourceType::Organization, container.clone());
        (container, store)
    }

    fn rename(display_name: &'static str) -> Mutation<Org> {
        mutation(move |_| Ok(org(display_name)))
    }

    #[tokio::test]
    async fn test_create_get_derives_stable_identity() {
        let (container, store) = setup();

        let created = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();
        let blob = container.get("acme").await.unwrap();
        let expected_uid = derive_uid(&blob.uid);

        assert_eq!(created.metadata.uid, Some(expected_uid));
        assert_eq!(created.metadata.creation_timestamp, Some(blob.creation_timestamp));
        assert_eq!(created.version(), Some(blob.version.as_str()));

        let first = store.get(&ctx(), "acme").await.unwrap();
        let second = store.get(&ctx(), "acme").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.payload, org("Acme"));
        assert_eq!(first.metadata.uid, Some(expected_uid));
    }

    #[tokio::test]
    async fn test_create_existing_name() {
        let (_, store) = setup();
        store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();

        let err = store
            .create(&ctx(), Resource::new("acme", org("Other")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_create_validates_name() {
        let (_, store) = setup();
        let err = store
            .create(&ctx(), Resource::new("Not Valid", org("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_create_with_generated_name() {
        let (_, store) = setup();
        let created = store
            .create(&ctx(), Resource::generated("org-", org("Generated")))
            .await
            .unwrap();

        assert!(created.name().starts_with("org-"));
        assert_eq!(created.name().len(), 9);
        assert!(created.metadata.generate_name.is_none());
        assert_eq!(store.get(&ctx(), created.name()).await.unwrap().payload, org("Generated"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, store) = setup();
        let err = store.get(&ctx(), "ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "organizations \"ghost\" not found");
    }

    #[tokio::test]
    async fn test_update_changes_version_not_identity() {
        let (_, store) = setup();
        let created = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();

        let (updated, was_created) = store
            .update(
                &ctx(),
                "acme",
                mutation(|old: Option<Org>| {
                    let mut org = old.ok_or_else(|| StoreError::Internal("missing".into()))?;
                    org.display_name.push_str(" Inc");
                    Ok(org)
                }),
                false,
            )
            .await
            .unwrap();

        assert!(!was_created);
        assert_eq!(updated.payload, org("Acme Inc"));
        assert_ne!(updated.version(), created.version());
        assert_eq!(updated.metadata.uid, created.metadata.uid);
        assert_eq!(updated.metadata.creation_timestamp, created.metadata.creation_timestamp);
    }

    #[tokio::test]
    async fn test_update_missing_without_create() {
        let (_, store) = setup();
        let err = store.update(&ctx(), "ghost", rename("x"), false).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_with_create() {
        let (_, store) = setup();
        let (resource, created) = store
            .update(
                &ctx(),
                "acme",
                mutation(|old: Option<Org>| {
                    assert!(old.is_none());
                    Ok(org("Fresh"))
                }),
                true,
            )
            .await
            .unwrap();

        assert!(created);
        assert_eq!(resource.payload, org("Fresh"));
        assert!(resource.metadata.uid.is_some());
    }

    #[tokio::test]
    async fn test_update_mutation_error_leaves_resource() {
        let (_, store) = setup();
        let created = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();

        let err = store
            .update(
                &ctx(),
                "acme",
                mutation(|_| Err(StoreError::ValidationFailed("rejected".into()))),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
        assert_eq!(store.get(&ctx(), "acme").await.unwrap(), created);
    }

    /// Holds every patch until two are pending, so both writers have read
    /// the same state before either writes.
    struct LockstepContainer {
        inner: MemoryBlobContainer,
        barrier: tokio::sync::Barrier,
    }

    #[async_trait]
    impl BlobContainer for LockstepContainer {
        async fn get(&self, name: &str) -> ContainerResult<BlobEntry> {
            self.inner.get(name).await
        }

        async fn create(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry> {
            self.inner.create(name, bytes).await
        }

        async fn patch(&self, name: &str, bytes: Vec<u8>) -> ContainerResult<BlobEntry> {
            self.barrier.wait().await;
            self.inner.patch(name, bytes).await
        }

        async fn delete(&self, name: &str) -> ContainerResult<BlobEntry> {
            self.inner.delete(name).await
        }

        async fn list(&self, options: &ListOptions) -> ContainerResult<BlobList> {
            self.inner.list(options).await
        }

        async fn watch(&self, options: &ListOptions) -> ContainerResult<platform_events::ChangeFeed<BlobEntry>> {
            self.inner.watch(options).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_updates_last_write_wins() {
        let container = Arc::new(LockstepContainer {
            inner: MemoryBlobContainer::new(),
            barrier: tokio::sync::Barrier::new(2),
        });
        let store: BlobStore<Org> = BlobStore::new(ResourceType::Organization, container.clone());
        store.create(&ctx(), Resource::new("acme", org("v0"))).await.unwrap();

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let observe = |display_name: &'static str| -> Mutation<Org> {
            let seen = seen.clone();
            mutation(move |current: Option<Org>| {
                seen.lock().unwrap().push(current.map(|o| o.display_name));
                Ok(org(display_name))
            })
        };

        let ctx_a = ctx();
        let ctx_b = ctx();
        let (a, b) = tokio::join!(
            store.update(&ctx_a, "acme", observe("from-a"), false),
            store.update(&ctx_b, "acme", observe("from-b"), false),
        );

        // Neither writer is rejected; both mutated the same base state.
        let (a, a_created) = a.unwrap();
        let (b, b_created) = b.unwrap();
        assert!(!a_created && !b_created);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("v0".to_string()), Some("v0".to_string())]
        );

        let rev = |r: &Resource<Org>| r.version().unwrap().parse::<u64>().unwrap();
        assert_ne!(rev(&a), rev(&b));
        let last = if rev(&a) > rev(&b) { &a } else { &b };

        let final_state = store.get(&ctx(), "acme").await.unwrap();
        assert_eq!(final_state.payload, last.payload);
        assert_eq!(final_state.version(), last.version());
    }

    #[tokio::test]
    async fn test_delete_returns_last_state() {
        let (_, store) = setup();
        let created = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();

        let (last, deleted) = store.delete(&ctx(), "acme").await.unwrap();
        assert!(deleted);
        assert_eq!(last.payload, created.payload);
        assert_eq!(last.metadata.uid, created.metadata.uid);
        assert!(store.get(&ctx(), "acme").await.unwrap_err().is_not_found());
        assert!(store.delete(&ctx(), "acme").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_recreate_gets_new_uid() {
        let (_, store) = setup();
        let first = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();
        store.delete(&ctx(), "acme").await.unwrap();
        let second = store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();
        assert_ne!(first.metadata.uid, second.metadata.uid);
    }

    #[tokio::test]
    async fn test_undecodable_blob_is_internal() {
        let (container, store) = setup();
        container.create("broken", b"not json".to_vec()).await.unwrap();

        let err = store.get(&ctx(), "broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_undecodable_blob_survives_delete() {
        let (container, store) = setup();
        container.create("broken", b"not json".to_vec()).await.unwrap();

        let err = store.delete(&ctx(), "broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
        assert_eq!(container.get("broken").await.unwrap().bytes, b"not json".to_vec());
    }

    #[tokio::test]
    async fn test_list_fails_on_any_undecodable_item() {
        let (container, store) = setup();
        store.create(&ctx(), Resource::new("a", org("A"))).await.unwrap();
        container.create("b", b"{".to_vec()).await.unwrap();

        let err = store.list(&ctx(), &ListOptions::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[tokio::test]
    async fn test_list_pages_and_clamps() {
        let container = Arc::new(MemoryBlobContainer::new());
        let store: BlobStore<Org> = BlobStore::new(ResourceType::Organization, container).with_config(StoreConfig {
            max_page_size: 2,
            ..StoreConfig::default()
        });
        for name in ["c", "a", "b"] {
            store.create(&ctx(), Resource::new(name, org(name))).await.unwrap();
        }

        let page = store.list(&ctx(), &ListOptions::with_limit(100)).await.unwrap();
        assert_eq!(page.names(), vec!["a", "b"]);

        let token = page.continue_token.unwrap();
        let page = store
            .list(&ctx(), &ListOptions::default().continuing(token))
            .await
            .unwrap();
        assert_eq!(page.names(), vec!["c"]);
        assert!(page.continue_token.is_none());
    }

    #[tokio::test]
    async fn test_list_bad_token_is_validation_error() {
        let (_, store) = setup();
        let err = store
            .list(&ctx(), &ListOptions::default().continuing("%%%"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_watch_decodes_and_reports_bad_events() {
        let (container, store) = setup();
        let mut stream = store.watch(&ctx(), &ListOptions::default()).await.unwrap();

        store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();
        container.create("broken", b"garbage".to_vec()).await.unwrap();
        store.update(&ctx(), "acme", rename("Acme 2"), false).await.unwrap();

        let mut received = Vec::new();
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_millis(500), stream.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(event);
        }

        assert_eq!(received[0].event_type(), EventType::Added);
        assert_eq!(received[0].object().unwrap().payload, org("Acme"));
        match &received[1] {
            WatchEvent::Error(status) => assert_eq!(status.code, 500),
            other => panic!("expected error event, got {:?}", other),
        }
        assert_eq!(received[2].event_type(), EventType::Modified);
        assert_eq!(received[2].object().unwrap().payload, org("Acme 2"));
    }

    #[tokio::test]
    async fn test_watch_with_initial_events() {
        let (_, store) = setup();
        store.create(&ctx(), Resource::new("acme", org("Acme"))).await.unwrap();

        let mut stream = store
            .watch(&ctx(), &ListOptions::default().with_initial_events())
            .await
            .unwrap();
        let event = tokio::time::timeout(Duration::from_millis(500), stream.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type(), EventType::Added);
        assert_eq!(event.object().unwrap().name(), "acme");
    }

    #[tokio::test]
    async fn test_lagging_watch_gets_expired_error() {
        let container = Arc::new(MemoryBlobContainer::with_capacity(2));
        let store: BlobStore<Org> = BlobStore::new(ResourceType::Organization, container.clone())
            .with_config(StoreConfig {
                watch_buffer_size: 1,
                ..StoreConfig::default()
            });
        let mut stream = store.watch(&ctx(), &ListOptions::default()).await.unwrap();

        for i in 0..10 {
            container.create(&format!("org-{}", i), b"{\"display_name\":\"x\"}".to_vec()).await.unwrap();
        }

        let mut last = None;
        while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(500), stream.recv()).await {
            last = Some(event);
        }
        match last {
            Some(WatchEvent::Error(status)) => assert_eq!(status.code, 410),
            other => panic!("expected expired error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_narrowed_capabilities() {
        let (_, store) = setup();
        let store = store.with_capabilities(Capabilities::READ_ONLY.without(Verb::Watch));

        assert_eq!(store.capabilities().verbs(), vec![Verb::Get, Verb::List]);
        assert!(matches!(
            store.create(&ctx(), Resource::new("acme", org("Acme"))).await,
            Err(StoreError::MethodNotSupported(Verb::Create))
        ));
        assert!(matches!(
            store.watch(&ctx(), &ListOptions::default()).await,
            Err(StoreError::MethodNotSupported(Verb::Watch))
        ));
        assert!(store.list(&ctx(), &ListOptions::default()).await.unwrap().items.is_empty());
    }
}
