//! Error types for billing record operations

use platform_rbac::ResourceType;
use platform_store::StoreError;
use thiserror::Error;

use crate::records::RecordId;

/// Billing record error types.
#[derive(Debug, Error)]
pub enum BillingError {
    /// A partner record does not exist.
    #[error("Partner record {0} not found")]
    RecordNotFound(RecordId),

    /// No complete, confirmed billing entity exists for this company record.
    #[error("Billing entity {0} not found")]
    EntityNotFound(RecordId),

    /// The record system refused the request.
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// The record system could not be reached or failed.
    #[error("Record system unavailable: {0}")]
    Unavailable(String),
}

/// Result type for billing record operations.
pub type BillingResult<T> = Result<T, BillingError>;

impl BillingError {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::RecordNotFound(_) | BillingError::EntityNotFound(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            BillingError::RecordNotFound(_) | BillingError::EntityNotFound(_) => 404,
            BillingError::Rejected(_) => 422,
            BillingError::Unavailable(_) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            BillingError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            BillingError::EntityNotFound(_) => "NOT_FOUND",
            BillingError::Rejected(_) => "RECORD_REJECTED",
            BillingError::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl From<BillingError> for StoreError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::EntityNotFound(id) => StoreError::not_found(ResourceType::BillingAccount, id.to_string()),
            BillingError::Rejected(msg) => StoreError::ValidationFailed(msg),
            other => StoreError::Internal(other.to_string()),
        }
    }
}
