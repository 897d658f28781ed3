//! # Resource Types
//!
//! Defines the resource collections exposed through the generic resource API.
//! Resource types appear in permissions, authorization requests and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource collections that can have permissions assigned.
///
/// - **Tenancy**: Organization, Membership, Invitation
/// - **Billing**: BillingAccount
/// - **Access control**: Role, RoleBinding (created as provisioning side effects)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Organization resources.
    Organization,
    /// Billing account resources.
    BillingAccount,
    /// Organization invitation resources.
    Invitation,
    /// Organization membership resources.
    Membership,
    /// Role resources (permission sets).
    Role,
    /// Role binding resources (subject to role links).
    RoleBinding,
}

impl ResourceType {
    /// Get the plural collection name used on the wire and in permissions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Organization => "organizations",
            ResourceType::BillingAccount => "billingaccounts",
            ResourceType::Invitation => "invitations",
            ResourceType::Membership => "memberships",
            ResourceType::Role => "roles",
            ResourceType::RoleBinding => "rolebindings",
        }
    }

    /// Get the singular kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceType::Organization => "Organization",
            ResourceType::BillingAccount => "BillingAccount",
            ResourceType::Invitation => "Invitation",
            ResourceType::Membership => "Membership",
            ResourceType::Role => "Role",
            ResourceType::RoleBinding => "RoleBinding",
        }
    }

    /// Parse resource type from its plural, singular or kind name.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::resources::ResourceType;
    ///
    /// assert_eq!(ResourceType::parse("organizations"), Some(ResourceType::Organization));
    /// assert_eq!(ResourceType::parse("BillingAccount"), Some(ResourceType::BillingAccount));
    /// assert_eq!(ResourceType::parse("documents"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "organizations" | "organization" => Some(ResourceType::Organization),
            "billingaccounts" | "billingaccount" => Some(ResourceType::BillingAccount),
            "invitations" | "invitation" => Some(ResourceType::Invitation),
            "memberships" | "membership" => Some(ResourceType::Membership),
            "roles" | "role" => Some(ResourceType::Role),
            "rolebindings" | "rolebinding" => Some(ResourceType::RoleBinding),
            _ => None,
        }
    }

    /// Get all resource types.
    pub fn all() -> Vec<Self> {
        vec![
            ResourceType::Organization,
            ResourceType::BillingAccount,
            ResourceType::Invitation,
            ResourceType::Membership,
            ResourceType::Role,
            ResourceType::RoleBinding,
        ]
    }

    /// Check if this resource type belongs to the access-control machinery.
    pub fn is_access_control(&self) -> bool {
        matches!(self, ResourceType::Role | ResourceType::RoleBinding)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_parsing() {
        for resource in ResourceType::all() {
            assert_eq!(ResourceType::parse(resource.as_str()), Some(resource));
            assert_eq!(ResourceType::parse(resource.kind()), Some(resource));
        }
        assert_eq!(ResourceType::parse("projects"), None);
    }

    #[test]
    fn test_access_control_types() {
        assert!(ResourceType::Role.is_access_control());
        assert!(ResourceType::RoleBinding.is_access_control());
        assert!(!ResourceType::Organization.is_access_control());
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceType::BillingAccount.to_string(), "billingaccounts");
    }
}
