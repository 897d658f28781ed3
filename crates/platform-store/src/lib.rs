//! # Platform Store
//!
//! This crate provides versioned resource storage for the Relay platform's
//! declarative resource API.
//!
//! ## Overview
//!
//! The platform-store crate handles:
//! - **Resources**: Named, versioned records with derived identity metadata
//! - **Store Contract**: A generic CRUD + watch trait with static capabilities
//! - **Blob Store**: A generic store persisting each resource as one blob
//! - **Containers**: The backing blob contract and an in-memory container
//! - **Errors**: Typed API errors and multi-cause aggregation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_rbac::{Actor, ResourceType};
//! use platform_store::{BlobStore, MemoryBlobContainer, RequestContext, Resource, Store};
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let container = Arc::new(MemoryBlobContainer::new());
//!     let store: BlobStore<String> = BlobStore::new(ResourceType::Organization, container);
//!     let ctx = RequestContext::new(Actor::new("alice"));
//!
//!     let created = store
//!         .create(&ctx, Resource::new("acme", "Acme Corp".to_string()))
//!         .await
//!         .unwrap();
//!     assert!(created.metadata.uid.is_some());
//!
//!     let fetched = store.get(&ctx, "acme").await.unwrap();
//!     assert_eq!(fetched.metadata.uid, created.metadata.uid);
//! }
//! ```
//!
//! ## Identity
//!
//! A resource's UID is a UUIDv5 of its backing blob's UID (see
//! [`identity`]); its creation timestamp and version are the blob's. None of
//! them is stored separately.

pub mod blob;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod identity;
pub mod memory;
pub mod names;
pub mod resource;
pub mod store;

// Re-export main types
pub use blob::{map_container_error, BlobStore};
pub use codec::{Codec, CodecError, JsonCodec};
pub use config::{ConfigError, StoreConfig};
pub use container::{BlobContainer, BlobEntry, BlobList, ContainerError, ContainerResult};
pub use error::{MultiError, StoreError, StoreResult};
pub use identity::{derive_uid, UID_NAMESPACE, UID_NAMESPACE_V1};
pub use memory::MemoryBlobContainer;
pub use names::{generate_name, validate_name, MAX_NAME_LENGTH};
pub use resource::{ListOptions, ObjectMeta, Payload, Resource, ResourceList};
pub use store::{mutation, Capabilities, Mutation, RequestContext, Store};
