//! # Verbs
//!
//! Defines the verbs of the generic resource API.
//! Every call against a resource store is authorized as exactly one verb.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verbs that can be performed on resources.
///
/// The first six map one-to-one onto store operations:
/// - **Get**: Read a single resource by name
/// - **List**: Read a page of a resource collection
/// - **Watch**: Subscribe to changes of a resource collection
/// - **Create**: Create a new resource
/// - **Update**: Modify an existing resource
/// - **Delete**: Remove a resource
///
/// `All` only appears in grants, where it stands for every verb.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    /// Read a single resource.
    Get,

    /// Read a page of resources.
    List,

    /// Subscribe to resource changes.
    Watch,

    /// Create a new resource.
    Create,

    /// Modify an existing resource.
    Update,

    /// Remove a resource.
    Delete,

    /// Wildcard verb, granted as `*`.
    #[serde(rename = "*")]
    All,
}

impl Verb {
    /// Get the string representation of the verb.
    ///
    /// # Returns
    ///
    /// A static string representation of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::List => "list",
            Verb::Watch => "watch",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::All => "*",
        }
    }

    /// Parse verb from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, supports aliases)
    ///
    /// # Returns
    ///
    /// `Some(Verb)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::verbs::Verb;
    ///
    /// assert_eq!(Verb::parse("get"), Some(Verb::Get));
    /// assert_eq!(Verb::parse("patch"), Some(Verb::Update));
    /// assert_eq!(Verb::parse("*"), Some(Verb::All));
    /// assert_eq!(Verb::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" | "read" => Some(Verb::Get),
            "list" => Some(Verb::List),
            "watch" => Some(Verb::Watch),
            "create" => Some(Verb::Create),
            "update" | "patch" => Some(Verb::Update),
            "delete" | "remove" => Some(Verb::Delete),
            "*" | "all" => Some(Verb::All),
            _ => None,
        }
    }

    /// Get all verbs that correspond to store operations.
    ///
    /// `All` is excluded since no operation is authorized as `*`.
    pub fn operations() -> [Self; 6] {
        [
            Verb::Get,
            Verb::List,
            Verb::Watch,
            Verb::Create,
            Verb::Update,
            Verb::Delete,
        ]
    }

    /// Check if this verb implies another verb.
    ///
    /// Only the wildcard implies other verbs. Write verbs deliberately do
    /// not imply `get`: being allowed to delete an object does not make it
    /// visible in lists.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_rbac::verbs::Verb;
    ///
    /// assert!(Verb::All.implies(Verb::Delete));
    /// assert!(!Verb::Update.implies(Verb::Get));
    /// ```
    pub fn implies(&self, other: Verb) -> bool {
        matches!(self, Verb::All) || *self == other
    }

    /// Check if this verb addresses a whole collection rather than one object.
    pub fn is_collection(&self) -> bool {
        matches!(self, Verb::List | Verb::Watch)
    }

    /// Check if this verb modifies resources.
    pub fn is_write(&self) -> bool {
        matches!(self, Verb::Create | Verb::Update | Verb::Delete)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
