//! # Platform Authorization
//!
//! This crate enforces authorization on the Relay platform's resource
//! stores.
//!
//! ## Overview
//!
//! The platform-auth crate handles:
//! - **Authorizing Store**: A [`Store`](platform_store::Store) decorator
//!   checking every call against an [`Authorizer`](platform_rbac::Authorizer)
//! - **List Filtering**: Per-item `get` checks on list results
//! - **Watch Filtering**: Per-event `get` checks on watch streams, with
//!   error and bookmark events always passed through
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_auth::AuthorizingStore;
//! use platform_rbac::{Actor, MemoryGrantStore, ResourceType};
//! use platform_store::{BlobStore, ListOptions, MemoryBlobContainer, RequestContext, Store};
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let grants = Arc::new(MemoryGrantStore::new());
//!     let raw = Arc::new(BlobStore::<String>::new(
//!         ResourceType::Organization,
//!         Arc::new(MemoryBlobContainer::new()),
//!     ));
//!     let store = AuthorizingStore::new(raw, grants);
//!
//!     // Without any bindings, alice may not list organizations.
//!     let ctx = RequestContext::new(Actor::new("alice"));
//!     assert!(store.list(&ctx, &ListOptions::default()).await.is_err());
//! }
//! ```
//!
//! ## Integration
//!
//! This crate integrates with:
//! - `platform-rbac`: The authorization decision point
//! - `platform-store`: The store contract it decorates
//! - `platform-events`: Watch stream plumbing

pub mod authorizing;
pub mod filter;

// Re-export main types
pub use authorizing::AuthorizingStore;
pub use filter::{can_get, filter_watch};
