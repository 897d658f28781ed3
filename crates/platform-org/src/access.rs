//! Owner access grants
//!
//! Every provisioned resource gets a role granting full access to exactly
//! that resource, and a binding of the creating actor to that role. Both are
//! named deterministically from the resource, see [`grant_object_name`].

use async_trait::async_trait;
use platform_rbac::{GrantError, GrantStore, Permission, PermissionSet, ResourceType, Role, RoleBinding, Verb};
use platform_store::{Payload, RequestContext, Resource, StoreError, StoreResult, MAX_NAME_LENGTH};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use crate::provisioner::SideEffect;

/// Hex characters of the hash suffix on shortened names.
pub const NAME_HASH_LENGTH: usize = 10;

/// Suffix of owner role and binding names.
pub const OWNER_SUFFIX: &str = "owner";

/// Name an auxiliary object for `name` in `resource`.
///
/// The natural name is `{resource}-{name}-{suffix}`. Names longer than
/// [`MAX_NAME_LENGTH`] are truncated and end in `-` plus the first
/// [`NAME_HASH_LENGTH`] hex characters of the natural name's SHA-256, so
/// distinct long names stay distinct.
///
/// # Examples
///
/// ```
/// use platform_org::grant_object_name;
/// use platform_rbac::ResourceType;
///
/// assert_eq!(
///     grant_object_name(ResourceType::Organization, "acme", "owner"),
///     "organizations-acme-owner"
/// );
///
/// let long = "a".repeat(300);
/// assert_eq!(grant_object_name(ResourceType::Organization, &long, "owner").len(), 253);
/// ```
pub fn grant_object_name(resource: ResourceType, name: &str, suffix: &str) -> String {
    let natural = format!("{}-{}-{}", resource, name, suffix);
    if natural.len() <= MAX_NAME_LENGTH {
        return natural;
    }

    let digest = Sha256::digest(natural.as_bytes());
    let mut hash = String::with_capacity(NAME_HASH_LENGTH);
    for byte in digest.iter() {
        let _ = write!(hash, "{:02x}", byte);
        if hash.len() >= NAME_HASH_LENGTH {
            break;
        }
    }
    hash.truncate(NAME_HASH_LENGTH);

    let mut keep = MAX_NAME_LENGTH - NAME_HASH_LENGTH - 1;
    while !natural.is_char_boundary(keep) {
        keep -= 1;
    }
    format!("{}-{}", &natural[..keep], hash)
}

fn map_grant_error(err: GrantError) -> StoreError {
    match err {
        GrantError::AlreadyExists { kind, name } => StoreError::already_exists(grant_resource(kind), name),
        GrantError::NotFound { kind, name } => StoreError::not_found(grant_resource(kind), name),
        GrantError::Unavailable(msg) => StoreError::Internal(msg),
    }
}

fn grant_resource(kind: &str) -> ResourceType {
    if kind == "RoleBinding" {
        ResourceType::RoleBinding
    } else {
        ResourceType::Role
    }
}

/// Creates a role granting every verb on the provisioned resource only.
pub struct OwnerRoleGrant {
    grants: Arc<dyn GrantStore>,
    resource: ResourceType,
}

impl OwnerRoleGrant {
    /// Grant owner roles for resources of type `resource`.
    pub fn new(grants: Arc<dyn GrantStore>, resource: ResourceType) -> Self {
        Self { grants, resource }
    }

    /// Name of the owner role for the resource `name`.
    pub fn role_name(&self, name: &str) -> String {
        grant_object_name(self.resource, name, OWNER_SUFFIX)
    }
}

#[async_trait]
impl<T: Payload> SideEffect<T> for OwnerRoleGrant {
    fn kind(&self) -> &'static str {
        "owner-role"
    }

    async fn apply(&self, _ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()> {
        let mut permissions = PermissionSet::new();
        permissions.add(Permission::for_resource(self.resource, Verb::All, resource.name()));

        let role = Role::new(self.role_name(resource.name()), permissions);
        let role = self.grants.create_role(role).await.map_err(map_grant_error)?;
        debug!(role = %role.name, "Owner role created");
        Ok(())
    }

    async fn revert(&self, _ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()> {
        match self.grants.delete_role(&self.role_name(resource.name())).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(map_grant_error(e)),
        }
    }
}

/// Binds the creating actor to the resource's owner role.
pub struct OwnerBindingGrant {
    grants: Arc<dyn GrantStore>,
    resource: ResourceType,
}

impl OwnerBindingGrant {
    /// Bind creators of resources of type `resource`.
    pub fn new(grants: Arc<dyn GrantStore>, resource: ResourceType) -> Self {
        Self { grants, resource }
    }

    /// Name of the owner binding for the resource `name`.
    pub fn binding_name(&self, name: &str) -> String {
        grant_object_name(self.resource, name, OWNER_SUFFIX)
    }
}

#[async_trait]
impl<T: Payload> SideEffect<T> for OwnerBindingGrant {
    fn kind(&self) -> &'static str {
        "owner-binding"
    }

    async fn apply(&self, ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()> {
        let name = self.binding_name(resource.name());
        let binding = RoleBinding::for_actor(name.clone(), name, ctx.actor.name.clone());
        let binding = self.grants.create_binding(binding).await.map_err(map_grant_error)?;
        debug!(binding = %binding.name, subject = %binding.subject, "Owner binding created");
        Ok(())
    }

    async fn revert(&self, _ctx: &RequestContext, resource: &Resource<T>) -> StoreResult<()> {
        match self.grants.delete_binding(&self.binding_name(resource.name())).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(map_grant_error(e)),
        }
    }
}
