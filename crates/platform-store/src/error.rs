//! Error types for resource store operations
//!
//! This module defines the typed errors of the generic resource API and the
//! multi-cause aggregate used when a compensating action fails on top of
//! the error that triggered it.

use platform_events::Status;
use platform_rbac::{ResourceType, Verb};
use std::fmt;
use thiserror::Error;

/// Resource store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named resource does not exist.
    #[error("{resource} \"{name}\" not found")]
    NotFound {
        /// Resource collection.
        resource: ResourceType,
        /// Resource name.
        name: String,
    },

    /// A resource with this name already exists.
    #[error("{resource} \"{name}\" already exists")]
    AlreadyExists {
        /// Resource collection.
        resource: ResourceType,
        /// Resource name.
        name: String,
    },

    /// The actor may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The write conflicts with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store does not implement this verb.
    #[error("Method not supported: {0}")]
    MethodNotSupported(Verb),

    /// Stored data could not be read back, or a dependency failed.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The request is malformed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Several independent failures, in the order they happened.
    #[error(transparent)]
    Aggregate(MultiError),
}

/// Result type for resource store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Shorthand for a not-found error.
    pub fn not_found(resource: ResourceType, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            resource,
            name: name.into(),
        }
    }

    /// Shorthand for an already-exists error.
    pub fn already_exists(resource: ResourceType, name: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            resource,
            name: name.into(),
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get HTTP status code for this error.
    ///
    /// An aggregate reports the status of its first cause.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::AlreadyExists { .. } => 409,
            StoreError::Conflict(_) => 409,
            StoreError::Forbidden(_) => 403,
            StoreError::MethodNotSupported(_) => 405,
            StoreError::ValidationFailed(_) => 422,
            StoreError::Internal(_) => 500,
            StoreError::Aggregate(multi) => multi
                .errors()
                .first()
                .map(StoreError::status_code)
                .unwrap_or(500),
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::AlreadyExists { .. } => "ALREADY_EXISTS",
            StoreError::Forbidden(_) => "FORBIDDEN",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::MethodNotSupported(_) => "METHOD_NOT_SUPPORTED",
            StoreError::Internal(_) => "INTERNAL_ERROR",
            StoreError::ValidationFailed(_) => "VALIDATION_FAILED",
            StoreError::Aggregate(_) => "MULTIPLE_ERRORS",
        }
    }

    /// Render as a watch `Status`.
    pub fn to_status(&self) -> Status {
        Status::new(self.status_code(), self.error_code(), self.to_string())
    }
}

/// An ordered list of independent failures reported as one error.
///
/// Built with [`MultiError::aggregate`], which never produces an empty or
/// single-element aggregate.
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<StoreError>,
}

impl MultiError {
    /// Combine optional causes into at most one error.
    ///
    /// Absent causes are dropped and nested aggregates are flattened. No
    /// causes yields `None`; exactly one yields that error unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use platform_store::{MultiError, StoreError};
    ///
    /// assert!(MultiError::aggregate([None, None]).is_none());
    ///
    /// let err = MultiError::aggregate([
    ///     Some(StoreError::Internal("role create failed".into())),
    ///     None,
    ///     Some(StoreError::Internal("rollback failed".into())),
    /// ])
    /// .unwrap();
    /// assert!(matches!(err, StoreError::Aggregate(ref m) if m.len() == 2));
    /// ```
    pub fn aggregate<I>(causes: I) -> Option<StoreError>
    where
        I: IntoIterator<Item = Option<StoreError>>,
    {
        let mut errors = Vec::new();
        for cause in causes.into_iter().flatten() {
            match cause {
                StoreError::Aggregate(nested) => errors.extend(nested.errors),
                other => errors.push(other),
            }
        }

        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(StoreError::Aggregate(MultiError { errors })),
        }
    }

    /// The causes, in order.
    pub fn errors(&self) -> &[StoreError] {
        &self.errors
    }

    /// Number of causes.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false for aggregates built through [`MultiError::aggregate`].
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", err)?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for MultiError {}
