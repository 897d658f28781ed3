//! Invitation domain models
//!
//! An invitation asks someone to join an organization with a given role.
//! It is pending until accepted, declined or expired.

use chrono::{DateTime, Duration, Utc};
use platform_store::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

use crate::membership::Membership;
use crate::roles::OrganizationRole;

/// Default time an invitation stays valid.
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting a response
    Pending,
    /// Accepted; a membership exists
    Accepted,
    /// Declined by the invitee
    Declined,
}

/// An invitation to join an organization.
///
/// State transitions return `Conflict` when the invitation is no longer
/// pending, so they can be used directly inside a store update.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use platform_org::{Invitation, InvitationStatus, OrganizationRole};
///
/// let mut invitation = Invitation::new("acme", "bob@example.com", OrganizationRole::Member, "alice");
/// let membership = invitation.accept("bob", Utc::now()).unwrap();
/// assert_eq!(invitation.status, InvitationStatus::Accepted);
/// assert_eq!(membership.invited_by.as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    /// Organization resource name
    pub organization: String,

    /// Invitee email
    pub email: String,

    /// Role granted on acceptance
    pub role: OrganizationRole,

    /// Inviting actor name
    pub invited_by: String,

    /// Current state
    pub status: InvitationStatus,

    /// When the invitation stops being acceptable
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// Creates a pending invitation valid for [`DEFAULT_INVITATION_TTL_DAYS`].
    pub fn new(
        organization: impl Into<String>,
        email: impl Into<String>,
        role: OrganizationRole,
        invited_by: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            email: email.into(),
            role,
            invited_by: invited_by.into(),
            status: InvitationStatus::Pending,
            expires_at: Utc::now() + Duration::days(DEFAULT_INVITATION_TTL_DAYS),
        }
    }

    /// Set the expiry.
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Check if the invitation has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the invitation can still be answered at `now`.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    fn ensure_pending(&self, now: DateTime<Utc>) -> StoreResult<()> {
        if self.status != InvitationStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "invitation for {} is already {:?}",
                self.email, self.status
            )));
        }
        if self.is_expired(now) {
            return Err(StoreError::Conflict(format!(
                "invitation for {} expired at {}",
                self.email, self.expires_at
            )));
        }
        Ok(())
    }

    /// Accept on behalf of `member`, returning the membership to create.
    pub fn accept(&mut self, member: impl Into<String>, now: DateTime<Utc>) -> StoreResult<Membership> {
        self.ensure_pending(now)?;
        self.status = InvitationStatus::Accepted;
        Ok(self.membership_for(member))
    }

    /// The membership this invitation grants to `member`.
    pub fn membership_for(&self, member: impl Into<String>) -> Membership {
        Membership::new(self.organization.clone(), member, self.role).with_inviter(self.invited_by.clone())
    }

    /// Decline the invitation.
    pub fn decline(&mut self, now: DateTime<Utc>) -> StoreResult<()> {
        self.ensure_pending(now)?;
        self.status = InvitationStatus::Declined;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation {
        Invitation::new("acme", "bob@example.com", OrganizationRole::Admin, "alice")
    }

    #[test]
    fn test_new_invitation_is_pending() {
        let invitation = invitation();
        assert!(invitation.is_pending(Utc::now()));
        assert!(invitation.expires_at > Utc::now() + Duration::days(6));
    }

    #[test]
    fn test_accept_creates_membership() {
        let mut invitation = invitation();
        let membership = invitation.accept("bob", Utc::now()).unwrap();

        assert_eq!(membership.object_name(), "acme-bob");
        assert_eq!(membership.role, OrganizationRole::Admin);
        assert!(!invitation.is_pending(Utc::now()));
    }

    #[test]
    fn test_cannot_answer_twice() {
        let mut invitation = invitation();
        invitation.decline(Utc::now()).unwrap();

        assert!(matches!(invitation.accept("bob", Utc::now()), Err(StoreError::Conflict(_))));
        assert_eq!(invitation.status, InvitationStatus::Declined);
    }

    #[test]
    fn test_expired_invitation() {
        let now = Utc::now();
        let mut invitation = invitation().expiring_at(now - Duration::minutes(1));

        assert!(invitation.is_expired(now));
        assert!(matches!(invitation.accept("bob", now), Err(StoreError::Conflict(_))));
        assert_eq!(invitation.status, InvitationStatus::Pending);
    }
}
