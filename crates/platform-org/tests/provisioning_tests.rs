//! End-to-end tests for organization provisioning.
//!
//! These tests drive the assembled [`ResourceApi`] the way a request handler
//! would: every call goes through authorization, organizations go through
//! the owner-grant provisioner, and grants land in a shared in-memory grant
//! store that also decides later requests.
//!
//! Test flows:
//! 1. create → owner role + binding → owner can read and delete
//! 2. binding name collision → create rolled back, no grants left
//! 3. another actor's organization stays forbidden
//! 4. invitation accepted → membership created

use platform_org::{Invitation, Membership, Organization, OrganizationRole, ResourceApi};
use platform_rbac::{
    Actor, GrantStore, MemoryGrantStore, Permission, PermissionSet, ResourceType, Role, RoleBinding, Verb,
};
use platform_store::{RequestContext, Resource, StoreConfig, StoreError};
use std::sync::Arc;

const ADMIN_GROUP: &str = "system:admins";

/// Test fixture with a grant store shared by provisioning and authorization.
struct Fixture {
    /// Grants and authorizer.
    grants: Arc<MemoryGrantStore>,
    /// The assembled API.
    api: ResourceApi,
}

impl Fixture {
    /// Create the API and let "alice" and "bob" create organizations.
    async fn new() -> Self {
        let grants = Arc::new(MemoryGrantStore::new().with_superuser_group(ADMIN_GROUP));

        let mut creators = PermissionSet::new();
        creators.add(Permission::new(ResourceType::Organization, Verb::Create));
        grants.create_role(Role::new("org-creator", creators)).await.unwrap();
        for actor in ["alice", "bob"] {
            grants
                .create_binding(RoleBinding::for_actor(format!("org-creator-{actor}"), "org-creator", actor))
                .await
                .unwrap();
        }

        let api = ResourceApi::in_memory(grants.clone(), StoreConfig::default());
        Self { grants, api }
    }

    fn ctx(actor: &str) -> RequestContext {
        RequestContext::new(Actor::new(actor))
    }

    fn admin() -> RequestContext {
        RequestContext::new(Actor::new("root").with_group(ADMIN_GROUP))
    }

    async fn create_org(&self, actor: &str, name: &str) -> Result<Resource<Organization>, StoreError> {
        self.api
            .organizations
            .create(&Self::ctx(actor), Resource::new(name, Organization::new(name, actor)))
            .await
    }
}

#[tokio::test]
async fn test_creator_owns_new_organization() {
    let fixture = Fixture::new().await;

    let created = fixture.create_org("alice", "acme").await.unwrap();
    assert_eq!(created.name(), "acme");
    assert_eq!(created.payload.created_by, "alice");

    let role = fixture.grants.get_role("organizations-acme-owner").await.unwrap();
    assert!(role
        .permissions
        .has(&Permission::for_resource(ResourceType::Organization, Verb::Delete, "acme")));
    let binding = fixture.grants.get_binding("organizations-acme-owner").await.unwrap();
    assert_eq!(binding.subject, "alice");
    assert_eq!(binding.role, "organizations-acme-owner");

    let fetched = fixture.api.organizations.get(&Fixture::ctx("alice"), "acme").await.unwrap();
    assert_eq!(fetched.payload.display_name, "acme");
}

#[tokio::test]
async fn test_delete_removes_owner_grants() {
    let fixture = Fixture::new().await;
    fixture.create_org("alice", "acme").await.unwrap();
    assert_eq!(fixture.grants.role_count().await, 2);

    let (last, deleted) = fixture
        .api
        .organizations
        .delete(&Fixture::ctx("alice"), "acme")
        .await
        .unwrap();
    assert!(deleted);
    assert_eq!(last.name(), "acme");

    assert_eq!(fixture.grants.role_count().await, 1);
    assert_eq!(fixture.grants.binding_count().await, 2);
    assert!(matches!(
        fixture.api.organizations.get(&Fixture::ctx("alice"), "acme").await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(fixture
        .api
        .organizations
        .get(&Fixture::admin(), "acme")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_binding_collision_rolls_back_create() {
    let fixture = Fixture::new().await;
    fixture
        .grants
        .create_binding(RoleBinding::for_actor(
            "organizations-bar-owner",
            "organizations-bar-owner",
            "mallory",
        ))
        .await
        .unwrap();

    let err = fixture.create_org("alice", "bar").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::AlreadyExists {
            resource: ResourceType::RoleBinding,
            ..
        }
    ));
    assert_eq!(err.status_code(), 409);

    // The role applied before the failure is gone, the foreign binding is not.
    assert!(fixture
        .grants
        .get_role("organizations-bar-owner")
        .await
        .unwrap_err()
        .is_not_found());
    assert_eq!(
        fixture.grants.get_binding("organizations-bar-owner").await.unwrap().subject,
        "mallory"
    );
    assert!(fixture
        .api
        .organizations
        .get(&Fixture::admin(), "bar")
        .await
        .unwrap_err()
        .is_not_found());

    // The name is free again once the collision is cleared.
    fixture.grants.delete_binding("organizations-bar-owner").await.unwrap();
    fixture.create_org("alice", "bar").await.unwrap();
}

#[tokio::test]
async fn test_other_organizations_are_forbidden() {
    let fixture = Fixture::new().await;
    fixture.create_org("alice", "acme").await.unwrap();
    fixture.create_org("bob", "globex").await.unwrap();

    let alice = Fixture::ctx("alice");
    assert!(matches!(
        fixture.api.organizations.get(&alice, "globex").await,
        Err(StoreError::Forbidden(_))
    ));
    assert!(matches!(
        fixture.api.organizations.delete(&alice, "globex").await,
        Err(StoreError::Forbidden(_))
    ));

    let all = fixture
        .api
        .organizations
        .list(&Fixture::admin(), &Default::default())
        .await
        .unwrap();
    assert_eq!(all.names(), vec!["acme", "globex"]);
}

#[tokio::test]
async fn test_accept_invitation_creates_membership() {
    let fixture = Fixture::new().await;
    fixture.create_org("alice", "acme").await.unwrap();

    fixture
        .api
        .invitations
        .create(
            &Fixture::admin(),
            Resource::new(
                "acme-carol",
                Invitation::new("acme", "carol@example.com", OrganizationRole::Member, "alice"),
            ),
        )
        .await
        .unwrap();

    let mut invitee = PermissionSet::new();
    invitee.add(Permission::for_resource(ResourceType::Invitation, Verb::Update, "acme-carol"));
    invitee.add(Permission::new(ResourceType::Membership, Verb::Create));
    fixture.grants.create_role(Role::new("invitee", invitee)).await.unwrap();
    fixture
        .grants
        .create_binding(RoleBinding::for_actor("invitee-carol", "invitee", "carol"))
        .await
        .unwrap();

    let carol = Fixture::ctx("carol");
    let membership = fixture.api.accept_invitation(&carol, "acme-carol").await.unwrap();
    assert_eq!(membership.name(), "acme-carol");
    assert_eq!(
        membership.payload,
        Membership {
            joined_at: membership.payload.joined_at,
            ..Membership::new("acme", "carol", OrganizationRole::Member).with_inviter("alice")
        }
    );

    let again = fixture.api.accept_invitation(&carol, "acme-carol").await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_accept_missing_invitation() {
    let fixture = Fixture::new().await;

    let err = fixture
        .api
        .accept_invitation(&Fixture::admin(), "nobody")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
