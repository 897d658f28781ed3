//! # Authorizer
//!
//! The authorization contract consulted before every resource access.
//! An authorizer answers one question: may this actor perform this verb on
//! these resource coordinates?

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::permissions::Permission;
use crate::resources::ResourceType;
use crate::verbs::Verb;

/// The identity on whose behalf a request is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor name (a user or service account identifier).
    pub name: String,

    /// Groups the actor belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Actor {
    /// Create an actor without group memberships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Add a group membership.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Check if the actor belongs to a group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a request points: a resource collection, optionally one object in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceCoordinates {
    /// Resource collection.
    pub resource: ResourceType,

    /// Object name, absent for collection-level requests.
    pub name: Option<String>,
}

impl fmt::Display for ResourceCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} \"{}\"", self.resource, name),
            None => write!(f, "{}", self.resource),
        }
    }
}

/// A single authorization question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Who is asking.
    pub actor: Actor,
    /// What they want to do.
    pub verb: Verb,
    /// What they want to do it to.
    pub coordinates: ResourceCoordinates,
}

impl AuthorizationRequest {
    /// Build a collection-level request.
    pub fn new(actor: Actor, verb: Verb, resource: ResourceType) -> Self {
        Self {
            actor,
            verb,
            coordinates: ResourceCoordinates {
                resource,
                name: None,
            },
        }
    }

    /// Scope the request to a single object. Empty names stay collection-level.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.coordinates.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// The permission an actor needs to be granted for this request.
    pub fn required_permission(&self) -> Permission {
        match &self.coordinates.name {
            Some(name) => Permission::for_resource(self.coordinates.resource, self.verb, name.clone()),
            None => Permission::new(self.coordinates.resource, self.verb),
        }
    }
}

/// The answer to an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The request is allowed.
    Allow,
    /// The request is denied, with a human-readable reason.
    Deny(String),
}

impl Decision {
    /// Check if the decision allows the request.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Authorizer error types.
///
/// An error means no decision could be reached; it is never a denial.
#[derive(Debug, Error)]
pub enum AuthorizerError {
    /// The authorizer backend could not be reached.
    #[error("Authorizer unavailable: {0}")]
    Unavailable(String),

    /// The request could not be evaluated.
    #[error("Invalid authorization request: {0}")]
    InvalidRequest(String),
}

/// Result type for authorizer operations.
pub type AuthorizerResult<T> = Result<T, AuthorizerError>;

/// Authorization decision point.
///
/// Implementations must be safe and reasonably cheap to call once per item
/// of a list or watch.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decide whether the request is allowed.
    async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizerResult<Decision>;
}

#[async_trait]
impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizerResult<Decision> {
        (**self).authorize(request).await
    }
}

/// Authorizer that allows everything. Intended for tests and trusted
/// in-process callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _request: &AuthorizationRequest) -> AuthorizerResult<Decision> {
        Ok(Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_groups() {
        let actor = Actor::new("alice").with_group("admins");
        assert!(actor.in_group("admins"));
        assert!(!actor.in_group("billing"));
        assert_eq!(actor.to_string(), "alice");
    }

    #[test]
    fn test_required_permission() {
        let request = AuthorizationRequest::new(Actor::new("alice"), Verb::Get, ResourceType::Organization)
            .with_name("acme");
        assert_eq!(request.required_permission().to_string(), "organizations:get:acme");

        let request = AuthorizationRequest::new(Actor::new("alice"), Verb::List, ResourceType::Organization);
        assert_eq!(request.required_permission().to_string(), "organizations:list");
    }

    #[test]
    fn test_empty_name_stays_collection_level() {
        let request = AuthorizationRequest::new(Actor::new("alice"), Verb::Create, ResourceType::Organization)
            .with_name("");
        assert!(request.coordinates.name.is_none());
        assert_eq!(request.coordinates.to_string(), "organizations");
    }

    #[tokio::test]
    async fn test_allow_all() {
        let request = AuthorizationRequest::new(Actor::new("anyone"), Verb::Delete, ResourceType::Role);
        let decision = AllowAll.authorize(&request).await.unwrap();
        assert!(decision.is_allowed());

        let shared: Arc<dyn Authorizer> = Arc::new(AllowAll);
        assert!(shared.authorize(&request).await.unwrap().is_allowed());
    }
}
