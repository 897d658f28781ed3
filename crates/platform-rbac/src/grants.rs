//! # Grants
//!
//! Roles and role bindings: the auxiliary access-control objects created
//! alongside primary resources. A role is a named permission set; a binding
//! attaches one role to one subject.
//!
//! [`MemoryGrantStore`] keeps both in memory and doubles as an
//! [`Authorizer`]: a request is allowed when any role bound to the actor (or
//! to one of the actor's groups) covers the required permission.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::authorizer::{AuthorizationRequest, Authorizer, AuthorizerResult, Decision};
use crate::permissions::PermissionSet;

/// Prefix marking a binding subject as a group rather than a single actor.
pub const GROUP_SUBJECT_PREFIX: &str = "group:";

/// A named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name.
    pub name: String,

    /// Permissions granted by this role.
    pub permissions: PermissionSet,

    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create a role with the given permissions.
    pub fn new(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            name: name.into(),
            permissions,
            created_at: Utc::now(),
        }
    }
}

/// Binds a role to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    /// Unique binding name.
    pub name: String,

    /// Name of the bound role.
    pub role: String,

    /// Actor name, or `group:<name>` for a group.
    pub subject: String,

    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

impl RoleBinding {
    /// Bind a role to a single actor.
    pub fn for_actor(name: impl Into<String>, role: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            subject: actor.into(),
            created_at: Utc::now(),
        }
    }

    /// Bind a role to every member of a group.
    pub fn for_group(name: impl Into<String>, role: impl Into<String>, group: &str) -> Self {
        Self::for_actor(name, role, format!("{}{}", GROUP_SUBJECT_PREFIX, group))
    }
}

/// Grant store error types.
#[derive(Debug, Error)]
pub enum GrantError {
    /// An object with this name already exists.
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists {
        /// Object kind (Role or RoleBinding).
        kind: &'static str,
        /// Object name.
        name: String,
    },

    /// No object with this name exists.
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        /// Object kind (Role or RoleBinding).
        kind: &'static str,
        /// Object name.
        name: String,
    },

    /// The grant backend failed.
    #[error("Grant store unavailable: {0}")]
    Unavailable(String),
}

impl GrantError {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GrantError::NotFound { .. })
    }
}

/// Result type for grant store operations.
pub type GrantResult<T> = Result<T, GrantError>;

/// Storage for roles and role bindings.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Create a role. Fails with `AlreadyExists` if the name is taken.
    async fn create_role(&self, role: Role) -> GrantResult<Role>;

    /// Fetch a role by name.
    async fn get_role(&self, name: &str) -> GrantResult<Role>;

    /// Delete a role by name. Fails with `NotFound` if absent.
    async fn delete_role(&self, name: &str) -> GrantResult<()>;

    /// Create a role binding. Fails with `AlreadyExists` if the name is taken.
    async fn create_binding(&self, binding: RoleBinding) -> GrantResult<RoleBinding>;

    /// Fetch a role binding by name.
    async fn get_binding(&self, name: &str) -> GrantResult<RoleBinding>;

    /// Delete a role binding by name. Fails with `NotFound` if absent.
    async fn delete_binding(&self, name: &str) -> GrantResult<()>;
}

/// In-memory grant store and authorizer.
///
/// Bindings referencing a missing role grant nothing.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    roles: RwLock<HashMap<String, Role>>,
    bindings: RwLock<HashMap<String, RoleBinding>>,
    superuser_groups: HashSet<String>,
}

impl MemoryGrantStore {
    /// Create an empty grant store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow members of `group` everything, without consulting bindings.
    pub fn with_superuser_group(mut self, group: impl Into<String>) -> Self {
        self.superuser_groups.insert(group.into());
        self
    }

    /// Number of stored roles.
    pub async fn role_count(&self) -> usize {
        self.roles.read().await.len()
    }

    /// Number of stored bindings.
    pub async fn binding_count(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// Compute the effective permissions of a request's actor.
    async fn effective_permissions(&self, request: &AuthorizationRequest) -> PermissionSet {
        let actor = &request.actor;
        let bindings = self.bindings.read().await;
        let roles = self.roles.read().await;

        let mut effective = PermissionSet::new();
        for binding in bindings.values() {
            let applies = match binding.subject.strip_prefix(GROUP_SUBJECT_PREFIX) {
                Some(group) => actor.in_group(group),
                None => binding.subject == actor.name,
            };
            if !applies {
                continue;
            }
            if let Some(role) = roles.get(&binding.role) {
                effective.merge(&role.permissions);
            }
        }
        effective
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn create_role(&self, role: Role) -> GrantResult<Role> {
        let mut roles = self.roles.write().await;
        if roles.contains_key(&role.name) {
            return Err(GrantError::AlreadyExists {
                kind: "Role",
                name: role.name,
            });
        }
        roles.insert(role.name.clone(), role.clone());
        Ok(role)
    }

    async fn get_role(&self, name: &str) -> GrantResult<Role> {
        self.roles
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| GrantError::NotFound {
                kind: "Role",
                name: name.to_string(),
            })
    }

    async fn delete_role(&self, name: &str) -> GrantResult<()> {
        match self.roles.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(GrantError::NotFound {
                kind: "Role",
                name: name.to_string(),
            }),
        }
    }

    async fn create_binding(&self, binding: RoleBinding) -> GrantResult<RoleBinding> {
        let mut bindings = self.bindings.write().await;
        if bindings.contains_key(&binding.name) {
            return Err(GrantError::AlreadyExists {
                kind: "RoleBinding",
                name: binding.name,
            });
        }
        bindings.insert(binding.name.clone(), binding.clone());
        Ok(binding)
    }

    async fn get_binding(&self, name: &str) -> GrantResult<RoleBinding> {
        self.bindings
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| GrantError::NotFound {
                kind: "RoleBinding",
                name: name.to_string(),
            })
    }

    async fn delete_binding(&self, name: &str) -> GrantResult<()> {
        match self.bindings.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(GrantError::NotFound {
                kind: "RoleBinding",
                name: name.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Authorizer for MemoryGrantStore {
    async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizerResult<Decision> {
        if request
            .actor
            .groups
            .iter()
            .any(|g| self.superuser_groups.contains(g))
        {
            return Ok(Decision::Allow);
        }

        let required = request.required_permission();
        if self.effective_permissions(request).await.has(&required) {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny(format!(
                "no role bound to \"{}\" grants {}",
                request.actor, required
            )))
        }
    }
}
