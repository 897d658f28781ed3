//! # Permissions
//!
//! Core permission types and sets for the RBAC system.
//! A permission combines a resource type with a verb, optionally scoped to
//! a single resource name.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::resources::ResourceType;
use crate::verbs::Verb;

/// A permission is a combination of resource type and verb.
///
/// Permissions can be:
/// - **Global**: Apply to every resource of this type, including collection
///   verbs such as `list` and `watch`
/// - **Name-scoped**: Apply only to the named resource
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::Permission;
/// use platform_rbac::resources::ResourceType;
/// use platform_rbac::verbs::Verb;
///
/// let perm = Permission::new(ResourceType::Organization, Verb::List);
/// assert_eq!(perm.to_string(), "organizations:list");
///
/// let perm = Permission::for_resource(ResourceType::Organization, Verb::Get, "acme");
/// assert_eq!(perm.to_string(), "organizations:get:acme");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// The resource type this permission applies to.
    pub resource: ResourceType,
    /// The verb allowed on the resource.
    pub verb: Verb,
    /// Optional: the single resource name this permission applies to.
    /// If None, applies to all resources of this type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

impl Permission {
    /// Create a new global permission.
    pub fn new(resource: ResourceType, verb: Verb) -> Self {
        Self {
            resource,
            verb,
            resource_name: None,
        }
    }

    /// Create a permission for a single named resource.
    pub fn for_resource(resource: ResourceType, verb: Verb, name: impl Into<String>) -> Self {
        Self {
            resource,
            verb,
            resource_name: Some(name.into()),
        }
    }

    /// Parse from string (e.g., "organizations:get" or "organizations:*:acme").
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::permissions::Permission;
    /// use platform_rbac::verbs::Verb;
    ///
    /// let perm = Permission::from_string("organizations:*:acme").unwrap();
    /// assert_eq!(perm.verb, Verb::All);
    /// assert_eq!(perm.resource_name.as_deref(), Some("acme"));
    /// ```
    pub fn from_string(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, ':');
        let resource = ResourceType::parse(parts.next()?)?;
        let verb = Verb::parse(parts.next()?)?;
        let resource_name = parts.next().map(str::to_string);

        Some(Self {
            resource,
            verb,
            resource_name,
        })
    }

    /// Check if this (granted) permission covers a requested permission.
    ///
    /// A grant covers a request if:
    /// - Resource types match
    /// - The granted verb implies the requested verb
    /// - The grant is global, or both name the same resource
    ///
    /// A name-scoped grant never covers a collection-level request.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::permissions::Permission;
    /// use platform_rbac::resources::ResourceType;
    /// use platform_rbac::verbs::Verb;
    ///
    /// let grant = Permission::for_resource(ResourceType::Organization, Verb::All, "acme");
    /// let get = Permission::for_resource(ResourceType::Organization, Verb::Get, "acme");
    /// let list = Permission::new(ResourceType::Organization, Verb::List);
    ///
    /// assert!(grant.matches(&get));
    /// assert!(!grant.matches(&list));
    /// ```
    pub fn matches(&self, requested: &Permission) -> bool {
        if self.resource != requested.resource {
            return false;
        }

        if !self.verb.implies(requested.verb) {
            return false;
        }

        match (&self.resource_name, &requested.resource_name) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(granted), Some(wanted)) => granted == wanted,
        }
    }

    /// Check if this is a global permission.
    pub fn is_global(&self) -> bool {
        self.resource_name.is_none()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_name {
            Some(name) => write!(f, "{}:{}:{}", self.resource, self.verb, name),
            None => write!(f, "{}:{}", self.resource, self.verb),
        }
    }
}

/// A set of permissions that can be assigned to roles.
///
/// # Example
///
/// ```
/// use platform_rbac::permissions::{Permission, PermissionSet};
/// use platform_rbac::resources::ResourceType;
/// use platform_rbac::verbs::Verb;
///
/// let mut set = PermissionSet::new();
/// set.add(Permission::new(ResourceType::Organization, Verb::List));
/// set.add(Permission::for_resource(ResourceType::Organization, Verb::All, "acme"));
///
/// assert!(set.has(&Permission::for_resource(ResourceType::Organization, Verb::Delete, "acme")));
/// assert!(!set.has(&Permission::for_resource(ResourceType::Organization, Verb::Get, "globex")));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Add multiple permissions to the set.
    pub fn add_all<I>(&mut self, permissions: I)
    where
        I: IntoIterator<Item = Permission>,
    {
        self.permissions.extend(permissions);
    }

    /// Remove a permission from the set.
    ///
    /// # Returns
    ///
    /// `true` if the permission was present, `false` otherwise
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Check if any permission in the set covers the requested permission.
    pub fn has(&self, requested: &Permission) -> bool {
        self.permissions.contains(requested) || self.permissions.iter().any(|p| p.matches(requested))
    }

    /// Iterate over the permissions in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Create from a list of permission strings, skipping unparsable entries.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::permissions::PermissionSet;
    ///
    /// let set = PermissionSet::from_strings(&["organizations:get", "memberships:list"]);
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn from_strings(perms: &[&str]) -> Self {
        perms.iter().filter_map(|p| Permission::from_string(p)).collect()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        set.add_all(iter);
        set
    }
}
