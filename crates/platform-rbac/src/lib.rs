//! # Platform RBAC (Role-Based Access Control)
//!
//! This crate provides the authorization vocabulary for the Relay platform's
//! declarative resource API.
//!
//! ## Overview
//!
//! The platform-rbac crate handles:
//! - **Verbs**: The operations of the generic resource API
//! - **Resources**: The resource collections exposed through that API
//! - **Permissions**: Resource + Verb [+ Name] combinations
//! - **Authorizer**: The decision point consulted before every access
//! - **Grants**: Roles and role bindings, plus an in-memory authorizer
//!
//! ## Architecture
//!
//! ```text
//! Permission = Resource + Verb [+ Resource Name]
//!
//! Examples:
//!   "organizations:list"          - List organizations
//!   "organizations:get:acme"      - Read the "acme" organization
//!   "organizations:*:acme"        - Do anything to the "acme" organization
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_rbac::{
//!     Actor, AuthorizationRequest, Authorizer, GrantStore, MemoryGrantStore, Permission,
//!     PermissionSet, ResourceType, Role, RoleBinding, Verb,
//! };
//!
//! async fn example() {
//!     let grants = MemoryGrantStore::new();
//!
//!     let mut permissions = PermissionSet::new();
//!     permissions.add(Permission::for_resource(ResourceType::Organization, Verb::All, "acme"));
//!     grants.create_role(Role::new("acme-owner", permissions)).await.unwrap();
//!     grants
//!         .create_binding(RoleBinding::for_actor("acme-owner-alice", "acme-owner", "alice"))
//!         .await
//!         .unwrap();
//!
//!     let request = AuthorizationRequest::new(Actor::new("alice"), Verb::Get, ResourceType::Organization)
//!         .with_name("acme");
//!     assert!(grants.authorize(&request).await.unwrap().is_allowed());
//! }
//! ```
//!
//! ## Verb Implications
//!
//! Only the wildcard verb `*` implies other verbs. Name-scoped grants never
//! cover collection-level requests such as `list` or `watch`.

pub mod authorizer;
pub mod grants;
pub mod permissions;
pub mod resources;
pub mod verbs;

// Re-export main types for convenience
pub use authorizer::{
    Actor, AllowAll, AuthorizationRequest, Authorizer, AuthorizerError, AuthorizerResult, Decision,
    ResourceCoordinates,
};
pub use grants::{GrantError, GrantResult, GrantStore, MemoryGrantStore, Role, RoleBinding};
pub use permissions::{Permission, PermissionSet};
pub use resources::ResourceType;
pub use verbs::Verb;
