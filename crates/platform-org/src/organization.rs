//! Organization domain models
//!
//! This module provides the Organization payload. Organizations are the
//! top-level tenant resources; their resource name is the URL-friendly
//! slug and the sole addressing key, so it is not repeated here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An organization represents a tenant in the multi-tenant system.
///
/// # Architecture
///
/// ```text
/// Organization (resource name = slug)
///   ├─ Owner role + binding (provisioned with the organization)
///   ├─ Memberships
///   ├─ Invitations
///   └─ Billing Accounts
/// ```
///
/// # Examples
///
/// ```
/// use platform_org::Organization;
///
/// let org = Organization::new("Acme Corp", "alice");
/// assert_eq!(org.display_name, "Acme Corp");
/// assert!(org.is_active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Human-readable name
    pub display_name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Primary website URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    /// Name of the actor who created the organization
    pub created_by: String,

    /// Whether the organization is active
    pub is_active: bool,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Organization {
    /// Creates a new, active organization.
    ///
    /// # Arguments
    ///
    /// * `display_name` - The organization's human-readable name
    /// * `created_by` - The creating actor's name
    pub fn new(display_name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: None,
            website_url: None,
            created_by: created_by.into(),
            is_active: true,
            metadata: HashMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the website URL.
    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    /// Mark the organization inactive without deleting it.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
