//! # Platform Organization Management
//!
//! This crate provides the organization resources of the Relay platform's
//! declarative resource API.
//!
//! ## Overview
//!
//! The platform-org crate handles:
//! - **Organizations**: Top-level tenant resources
//! - **Billing Accounts**: Plans and ERP links per organization
//! - **Memberships**: Actor-organization relationships
//! - **Invitations**: Pending memberships with expiry
//! - **Roles**: Hierarchical organization roles mapped to permissions
//! - **Provisioning**: Side effects created with a resource and rolled back
//!   if any of them fails
//! - **Access Grants**: Owner role and binding per provisioned resource
//!
//! ## Architecture
//!
//! ```text
//! caller
//!   └─ AuthorizingStore (platform-auth)
//!        └─ ProvisioningStore
//!             ├─ BlobStore (platform-store)
//!             ├─ OwnerRoleGrant    ─┐
//!             └─ OwnerBindingGrant ─┴─ GrantStore (platform-rbac)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_org::{Organization, ResourceApi};
//! use platform_rbac::{Actor, MemoryGrantStore, Permission, PermissionSet, ResourceType, Role, RoleBinding, Verb, GrantStore};
//! use platform_store::{RequestContext, Resource, StoreConfig};
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let grants = Arc::new(MemoryGrantStore::new());
//!     let mut creators = PermissionSet::new();
//!     creators.add(Permission::new(ResourceType::Organization, Verb::Create));
//!     grants.create_role(Role::new("org-creator", creators)).await.unwrap();
//!     grants
//!         .create_binding(RoleBinding::for_actor("org-creator-alice", "org-creator", "alice"))
//!         .await
//!         .unwrap();
//!
//!     let api = ResourceApi::in_memory(grants, StoreConfig::default());
//!     let ctx = RequestContext::new(Actor::new("alice"));
//!
//!     // Alice now owns "acme" through a provisioned role and binding.
//!     api.organizations
//!         .create(&ctx, Resource::new("acme", Organization::new("Acme Corp", "alice")))
//!         .await
//!         .unwrap();
//!     api.organizations.get(&ctx, "acme").await.unwrap();
//! }
//! ```

pub mod access;
pub mod api;
pub mod billing;
pub mod invitation;
pub mod membership;
pub mod organization;
pub mod provisioner;
pub mod roles;

// Re-export main types for convenience
pub use access::{grant_object_name, OwnerBindingGrant, OwnerRoleGrant, NAME_HASH_LENGTH, OWNER_SUFFIX};
pub use api::{ResourceApi, ResourceDescriptor};
pub use billing::{BillingAccount, ErpLink, Plan};
pub use invitation::{Invitation, InvitationStatus, DEFAULT_INVITATION_TTL_DAYS};
pub use membership::Membership;
pub use organization::Organization;
pub use provisioner::{ProvisioningStore, SideEffect};
pub use roles::OrganizationRole;
