//! Organization roles
//!
//! This module defines the role hierarchy within an organization and maps
//! each role to the permissions it grants on that organization's resources.

use platform_rbac::{Permission, PermissionSet, ResourceType, Verb};
use serde::{Deserialize, Serialize};

/// User role within an organization.
///
/// Roles are hierarchical, with each role inheriting the permissions of lower roles.
/// The hierarchy is: Viewer < Member < Admin < Owner
///
/// # Permission Model
///
/// - **Viewer**: Read-only access to the organization
/// - **Member**: Viewer, plus read access to memberships and invitations
/// - **Admin**: Can manage memberships and invitations
/// - **Owner**: Full control of the organization, including billing
///
/// # Examples
///
/// ```
/// use platform_org::OrganizationRole;
///
/// let role = OrganizationRole::Admin;
/// assert!(role.can_manage_members());
/// assert!(!role.can_manage_billing());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    /// Read-only access to the organization
    Viewer = 1,

    /// Regular member
    Member = 2,

    /// Can manage members and invitations
    Admin = 3,

    /// Full organization control
    Owner = 4,
}

impl OrganizationRole {
    /// Check if this role has admin privileges.
    pub fn is_admin(&self) -> bool {
        *self >= OrganizationRole::Admin
    }

    /// Check if this role can invite, remove and re-role members.
    pub fn can_manage_members(&self) -> bool {
        *self >= OrganizationRole::Admin
    }

    /// Check if this role can manage billing accounts.
    pub fn can_manage_billing(&self) -> bool {
        *self >= OrganizationRole::Owner
    }

    /// Parse role from string representation (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_org::OrganizationRole;
    ///
    /// assert_eq!(OrganizationRole::parse("admin"), Some(OrganizationRole::Admin));
    /// assert_eq!(OrganizationRole::parse("VIEWER"), Some(OrganizationRole::Viewer));
    /// assert_eq!(OrganizationRole::parse("guest"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Permissions this role grants on the organization named `org`.
    ///
    /// Organization-scoped grants are name-scoped to `org`. Memberships,
    /// invitations and billing accounts are global grants on their
    /// collections, because their names are not the organization's name.
    ///
    /// # Examples
    ///
    /// ```
    /// use platform_org::OrganizationRole;
    /// use platform_rbac::{Permission, ResourceType, Verb};
    ///
    /// let perms = OrganizationRole::Viewer.permissions("acme");
    /// assert!(perms.has(&Permission::for_resource(ResourceType::Organization, Verb::Get, "acme")));
    /// assert!(!perms.has(&Permission::for_resource(ResourceType::Organization, Verb::Update, "acme")));
    /// ```
    pub fn permissions(&self, org: &str) -> PermissionSet {
        let mut perms = PermissionSet::new();
        let on_org = |verb| Permission::for_resource(ResourceType::Organization, verb, org);

        perms.add(on_org(Verb::Get));
        if *self >= Self::Member {
            perms.add(Permission::new(ResourceType::Membership, Verb::Get));
            perms.add(Permission::new(ResourceType::Invitation, Verb::Get));
        }
        if *self >= Self::Admin {
            perms.add(on_org(Verb::Update));
            for resource in [ResourceType::Membership, ResourceType::Invitation] {
                perms.add(Permission::new(resource, Verb::All));
            }
        }
        if *self >= Self::Owner {
            perms.add(on_org(Verb::All));
            perms.add(Permission::new(ResourceType::BillingAccount, Verb::All));
        }
        perms
    }
}

impl Default for OrganizationRole {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
