//! Membership domain models
//!
//! A membership links an actor to an organization with a role. Its resource
//! name is derived from both, see [`Membership::object_name`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::OrganizationRole;

/// Organization membership linking an actor to an organization.
///
/// # Examples
///
/// ```
/// use platform_org::{Membership, OrganizationRole};
///
/// let membership = Membership::new("acme", "bob", OrganizationRole::Member);
/// assert_eq!(membership.object_name(), "acme-bob");
/// assert!(membership.is_active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Organization resource name
    pub organization: String,

    /// Member actor name
    pub member: String,

    /// Role within the organization
    pub role: OrganizationRole,

    /// When the member joined
    pub joined_at: DateTime<Utc>,

    /// Who invited this member (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,

    /// Whether the membership is active
    pub is_active: bool,

    /// Member's job title within the organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Membership {
    /// Creates a new active membership joined now.
    pub fn new(organization: impl Into<String>, member: impl Into<String>, role: OrganizationRole) -> Self {
        Self {
            organization: organization.into(),
            member: member.into(),
            role,
            joined_at: Utc::now(),
            invited_by: None,
            is_active: true,
            title: None,
        }
    }

    /// Set who invited this member.
    pub fn with_inviter(mut self, inviter: impl Into<String>) -> Self {
        self.invited_by = Some(inviter.into());
        self
    }

    /// Set the member's job title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Resource name for this membership: `{organization}-{member}`.
    pub fn object_name(&self) -> String {
        format!("{}-{}", self.organization, self.member)
    }

    /// Change the member's role.
    pub fn change_role(&mut self, role: OrganizationRole) {
        self.role = role;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_creation() {
        let membership = Membership::new("acme", "bob", OrganizationRole::Viewer).with_inviter("alice");

        assert_eq!(membership.organization, "acme");
        assert_eq!(membership.member, "bob");
        assert_eq!(membership.invited_by.as_deref(), Some("alice"));
        assert!(membership.is_active);
    }

    #[test]
    fn test_change_role() {
        let mut membership = Membership::new("acme", "bob", OrganizationRole::Viewer).with_title("CFO");
        membership.change_role(OrganizationRole::Admin);
        assert_eq!(membership.role, OrganizationRole::Admin);
        assert_eq!(membership.title.as_deref(), Some("CFO"));
    }
}
