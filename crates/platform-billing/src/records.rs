//! Linked-record system contract
//!
//! The ERP side of a billing account is a pair of partner records: a company
//! record and an invoice-address record pointing at it. The record system
//! offers single-record writes, batched updates and deletes, and search by
//! field, but no transaction spanning several records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BillingResult;
use crate::marker::is_cleared;

/// Record identifier assigned by the record system.
pub type RecordId = i64;

/// Role of a partner record within a billing entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// The legal entity being billed
    Company,
    /// Invoice address, linked to its company
    Invoice,
}

/// A partner record as stored by the record system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRecord {
    /// Record ID
    pub id: RecordId,

    /// Record kind
    pub kind: RecordKind,

    /// Display name
    pub name: String,

    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// External reference, the organization name
    pub reference: String,

    /// Linked company record, for invoice records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,

    /// Inflight marker; empty once the creation is confirmed
    #[serde(default)]
    pub marker: String,

    /// When the record system created the record
    pub created_at: DateTime<Utc>,
}

impl PartnerRecord {
    /// Check if the record still carries an inflight marker.
    pub fn is_inflight(&self) -> bool {
        !is_cleared(&self.marker)
    }
}

/// Fields of a record to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Record kind
    pub kind: RecordKind,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// External reference
    pub reference: String,
    /// Linked company record
    pub parent_id: Option<RecordId>,
    /// Inflight marker
    pub marker: String,
}

impl NewRecord {
    /// A company record.
    pub fn company(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Company,
            name: name.into(),
            email: None,
            reference: reference.into(),
            parent_id: None,
            marker: String::new(),
        }
    }

    /// An invoice-address record linked to `company`.
    pub fn invoice(
        name: impl Into<String>,
        email: impl Into<String>,
        reference: impl Into<String>,
        company: RecordId,
    ) -> Self {
        Self {
            kind: RecordKind::Invoice,
            name: name.into(),
            email: Some(email.into()),
            reference: reference.into(),
            parent_id: Some(company),
            marker: String::new(),
        }
    }

    /// Tag the record with an inflight marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

/// Field changes applied by a batched update. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    /// New display name
    pub name: Option<String>,
    /// New contact email
    pub email: Option<String>,
    /// New marker; `Some("")` clears it
    pub marker: Option<String>,
}

impl RecordPatch {
    /// A patch clearing the inflight marker.
    pub fn clear_marker() -> Self {
        Self {
            marker: Some(String::new()),
            ..Self::default()
        }
    }
}

/// Which markers a search matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MarkerFilter {
    /// Any marker state
    #[default]
    Any,
    /// Non-empty marker
    Set,
    /// Empty marker
    Cleared,
    /// This exact marker
    Equals(String),
}

impl MarkerFilter {
    fn matches(&self, marker: &str) -> bool {
        match self {
            MarkerFilter::Any => true,
            MarkerFilter::Set => !is_cleared(marker),
            MarkerFilter::Cleared => is_cleared(marker),
            MarkerFilter::Equals(expected) => marker == expected,
        }
    }
}

/// Search criteria. All given criteria must match.
///
/// # Examples
///
/// ```
/// use platform_billing::{MarkerFilter, RecordKind, SearchFilter};
///
/// let filter = SearchFilter::inflight().with_kind(RecordKind::Company);
/// assert_eq!(filter.marker, MarkerFilter::Set);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Restrict to these IDs
    pub ids: Option<Vec<RecordId>>,
    /// Restrict to one kind
    pub kind: Option<RecordKind>,
    /// Restrict to records linked to this company
    pub parent_id: Option<RecordId>,
    /// Marker state
    pub marker: MarkerFilter,
}

impl SearchFilter {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records still carrying a marker.
    pub fn inflight() -> Self {
        Self {
            marker: MarkerFilter::Set,
            ..Self::default()
        }
    }

    /// Match confirmed records only.
    pub fn confirmed() -> Self {
        Self {
            marker: MarkerFilter::Cleared,
            ..Self::default()
        }
    }

    /// Match records tagged with exactly `marker`.
    pub fn tagged(marker: impl Into<String>) -> Self {
        Self {
            marker: MarkerFilter::Equals(marker.into()),
            ..Self::default()
        }
    }

    /// Restrict to `ids`.
    pub fn with_ids(mut self, ids: impl Into<Vec<RecordId>>) -> Self {
        self.ids = Some(ids.into());
        self
    }

    /// Restrict to `kind`.
    pub fn with_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to records linked to `company`.
    pub fn with_parent(mut self, company: RecordId) -> Self {
        self.parent_id = Some(company);
        self
    }

    /// Check a record against the filter.
    pub fn matches(&self, record: &PartnerRecord) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&record.id))
            && self.kind.map_or(true, |kind| record.kind == kind)
            && self.parent_id.map_or(true, |parent| record.parent_id == Some(parent))
            && self.marker.matches(&record.marker)
    }
}

/// A remote partner record API.
///
/// Batched calls are one request each; whether a failing batch applied part
/// of its work is up to the implementation.
#[async_trait]
pub trait RecordSystem: Send + Sync {
    /// Create one record and return its ID.
    async fn create(&self, record: NewRecord) -> BillingResult<RecordId>;

    /// Apply `patch` to every record in `ids`.
    async fn update(&self, ids: &[RecordId], patch: &RecordPatch) -> BillingResult<()>;

    /// Delete every record in `ids`.
    async fn delete(&self, ids: &[RecordId]) -> BillingResult<()>;

    /// Records matching `filter`, in ID order.
    async fn search(&self, filter: &SearchFilter) -> BillingResult<Vec<PartnerRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: RecordId, kind: RecordKind, parent_id: Option<RecordId>, marker: &str) -> PartnerRecord {
        PartnerRecord {
            id,
            kind,
            name: "Acme Corp".to_string(),
            email: None,
            reference: "acme".to_string(),
            parent_id,
            marker: marker.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_marker_filter() {
        let tagged = record(1, RecordKind::Company, None, "m1");
        let confirmed = record(2, RecordKind::Company, None, "");

        assert!(SearchFilter::inflight().matches(&tagged));
        assert!(!SearchFilter::inflight().matches(&confirmed));
        assert!(SearchFilter::confirmed().matches(&confirmed));
        assert!(SearchFilter::all().matches(&tagged));

        let exact = SearchFilter::tagged("m1");
        assert_eq!(exact.marker, MarkerFilter::Equals("m1".to_string()));
        assert!(exact.matches(&tagged));
        assert!(!exact.matches(&confirmed));
        assert!(!SearchFilter::tagged("m2").matches(&tagged));
    }

    #[test]
    fn test_field_filters_combine() {
        let invoice = record(5, RecordKind::Invoice, Some(4), "");

        assert!(SearchFilter::all().with_parent(4).with_kind(RecordKind::Invoice).matches(&invoice));
        assert!(!SearchFilter::all().with_parent(9).matches(&invoice));
        assert!(!SearchFilter::all().with_kind(RecordKind::Company).matches(&invoice));
        assert!(SearchFilter::all().with_ids(vec![4, 5]).matches(&invoice));
        assert!(!SearchFilter::all().with_ids(vec![4]).matches(&invoice));
    }

    #[test]
    fn test_new_record_builders() {
        let company = NewRecord::company("Acme Corp", "acme").with_marker("m");
        assert_eq!(company.kind, RecordKind::Company);
        assert_eq!(company.marker, "m");

        let invoice = NewRecord::invoice("Acme Corp", "billing@acme.example", "acme", 3);
        assert_eq!(invoice.parent_id, Some(3));
        assert!(invoice.marker.is_empty());

        assert_eq!(RecordPatch::clear_marker().marker.as_deref(), Some(""));
    }
}
