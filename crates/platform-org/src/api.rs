//! Resource API wiring
//!
//! Assembles one authorized store per organization resource type:
//!
//! ```text
//! organizations   : AuthorizingStore -> ProvisioningStore(owner role, owner binding) -> BlobStore
//! billingaccounts : AuthorizingStore -> BlobStore
//! memberships     : AuthorizingStore -> BlobStore
//! invitations     : AuthorizingStore -> BlobStore (no watch)
//! ```

use chrono::Utc;
use platform_auth::AuthorizingStore;
use platform_rbac::{Authorizer, GrantStore, ResourceType, Verb};
use platform_store::{
    mutation, BlobContainer, BlobStore, Capabilities, MemoryBlobContainer, Payload, RequestContext, Resource,
    Store, StoreConfig, StoreError, StoreResult,
};
use std::sync::Arc;
use tracing::info;

use crate::access::{OwnerBindingGrant, OwnerRoleGrant};
use crate::billing::BillingAccount;
use crate::invitation::Invitation;
use crate::membership::Membership;
use crate::organization::Organization;
use crate::provisioner::ProvisioningStore;

/// Verbs served for one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Resource collection
    pub resource: ResourceType,
    /// Supported verbs
    pub verbs: Vec<Verb>,
}

/// The organization resource API.
pub struct ResourceApi {
    /// Organizations, provisioned with owner grants.
    pub organizations: Arc<dyn Store<Organization>>,
    /// Billing accounts.
    pub billing_accounts: Arc<dyn Store<BillingAccount>>,
    /// Memberships.
    pub memberships: Arc<dyn Store<Membership>>,
    /// Invitations.
    pub invitations: Arc<dyn Store<Invitation>>,
}

impl ResourceApi {
    /// Build the API over in-memory containers.
    ///
    /// `grants` stores the owner grants of new organizations and decides
    /// every request.
    pub fn in_memory<G>(grants: Arc<G>, config: StoreConfig) -> Self
    where
        G: GrantStore + Authorizer + 'static,
    {
        let grant_store: Arc<dyn GrantStore> = grants.clone();
        let authorizer: Arc<dyn Authorizer> = grants;

        let backing = |resource: ResourceType| {
            let container: Arc<dyn BlobContainer> = Arc::new(MemoryBlobContainer::from_config(&config));
            (resource, container)
        };

        let organizations: Arc<dyn Store<Organization>> = Arc::new(
            ProvisioningStore::new(raw_store(backing(ResourceType::Organization), &config, Capabilities::ALL))
                .with_side_effect(Arc::new(OwnerRoleGrant::new(
                    grant_store.clone(),
                    ResourceType::Organization,
                )))
                .with_side_effect(Arc::new(OwnerBindingGrant::new(
                    grant_store,
                    ResourceType::Organization,
                ))),
        );

        Self {
            organizations: authorize(organizations, &authorizer, &config),
            billing_accounts: authorize(
                raw_store(backing(ResourceType::BillingAccount), &config, Capabilities::ALL),
                &authorizer,
                &config,
            ),
            memberships: authorize(
                raw_store(backing(ResourceType::Membership), &config, Capabilities::ALL),
                &authorizer,
                &config,
            ),
            invitations: authorize(
                raw_store(
                    backing(ResourceType::Invitation),
                    &config,
                    Capabilities::ALL.without(Verb::Watch),
                ),
                &authorizer,
                &config,
            ),
        }
    }

    /// Served resource types and their verbs.
    pub fn discovery(&self) -> Vec<ResourceDescriptor> {
        [
            (self.organizations.resource(), self.organizations.capabilities()),
            (self.billing_accounts.resource(), self.billing_accounts.capabilities()),
            (self.memberships.resource(), self.memberships.capabilities()),
            (self.invitations.resource(), self.invitations.capabilities()),
        ]
        .into_iter()
        .map(|(resource, caps)| ResourceDescriptor {
            resource,
            verbs: caps.verbs(),
        })
        .collect()
    }

    /// Accept an invitation as the calling actor and create the membership.
    ///
    /// The invitation is marked accepted first; if the membership cannot be
    /// created the invitation stays accepted and the error is returned. The
    /// caller needs `update` on the invitation and `create` on memberships.
    pub async fn accept_invitation(&self, ctx: &RequestContext, name: &str) -> StoreResult<Resource<Membership>> {
        let member = ctx.actor.name.clone();
        let missing = name.to_string();
        let now = Utc::now();

        let (invitation, _) = self
            .invitations
            .update(
                ctx,
                name,
                mutation(move |current: Option<Invitation>| {
                    let mut invitation =
                        current.ok_or_else(|| StoreError::not_found(ResourceType::Invitation, missing))?;
                    invitation.accept(member, now)?;
                    Ok(invitation)
                }),
                false,
            )
            .await?;

        let membership = invitation.payload.membership_for(&ctx.actor.name);
        let created = self
            .memberships
            .create(ctx, Resource::new(membership.object_name(), membership))
            .await?;
        info!(invitation = %name, membership = %created.name(), "Invitation accepted");
        Ok(created)
    }
}

impl std::fmt::Debug for ResourceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceApi")
            .field("resources", &self.discovery())
            .finish()
    }
}

fn raw_store<T: Payload>(
    (resource, container): (ResourceType, Arc<dyn BlobContainer>),
    config: &StoreConfig,
    capabilities: Capabilities,
) -> Arc<dyn Store<T>> {
    Arc::new(
        BlobStore::new(resource, container)
            .with_config(config.clone())
            .with_capabilities(capabilities),
    )
}

fn authorize<T: Payload>(
    inner: Arc<dyn Store<T>>,
    authorizer: &Arc<dyn Authorizer>,
    config: &StoreConfig,
) -> Arc<dyn Store<T>> {
    Arc::new(AuthorizingStore::new(inner, Arc::clone(authorizer)).with_watch_buffer(config.watch_buffer_size))
}
