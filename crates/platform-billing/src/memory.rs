use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::{BillingError, BillingResult};
use crate::records::{NewRecord, PartnerRecord, RecordId, RecordKind, RecordPatch, RecordSystem, SearchFilter};

/// Calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `create` calls
    pub create: usize,
    /// `update` calls
    pub update: usize,
    /// `delete` calls
    pub delete: usize,
    /// `search` calls
    pub search: usize,
}

#[derive(Debug, Default)]
struct Failures {
    /// Creates still allowed before every create fails.
    creates_left: Option<usize>,
    updates: bool,
    deletes: bool,
}

#[derive(Debug)]
struct SystemState {
    records: BTreeMap<RecordId, PartnerRecord>,
    next_id: RecordId,
    failures: Failures,
    calls: CallCounts,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
            failures: Failures::default(),
            calls: CallCounts::default(),
        }
    }
}

impl SystemState {
    fn insert(&mut self, record: NewRecord, created_at: DateTime<Utc>) -> BillingResult<RecordId> {
        if record.name.trim().is_empty() {
            return Err(BillingError::Rejected("name is required".to_string()));
        }
        match (record.kind, record.parent_id) {
            (RecordKind::Company, Some(_)) => {
                return Err(BillingError::Rejected("company records cannot have a parent".to_string()));
            }
            (RecordKind::Invoice, None) => {
                return Err(BillingError::Rejected("invoice records need a company".to_string()));
            }
            (RecordKind::Invoice, Some(parent)) => match self.records.get(&parent) {
                Some(company) if company.kind == RecordKind::Company => {}
                _ => return Err(BillingError::RecordNotFound(parent)),
            },
            (RecordKind::Company, None) => {}
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(
            id,
            PartnerRecord {
                id,
                kind: record.kind,
                name: record.name,
                email: record.email,
                reference: record.reference,
                parent_id: record.parent_id,
                marker: record.marker,
                created_at,
            },
        );
        Ok(id)
    }

    fn ensure_exist(&self, ids: &[RecordId]) -> BillingResult<()> {
        match ids.iter().find(|id| !self.records.contains_key(id)) {
            Some(missing) => Err(BillingError::RecordNotFound(*missing)),
            None => Ok(()),
        }
    }
}

/// In-memory partner record system.
///
/// Batched updates and deletes are all-or-nothing: if any ID is unknown,
/// nothing changes. Failures can be injected per operation, and records can
/// be inserted with a past creation time.
#[derive(Debug, Default)]
pub struct MemoryRecordSystem {
    state: RwLock<SystemState>,
}

impl MemoryRecordSystem {
    /// Create an empty record system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record created at `created_at`, bypassing injected failures.
    pub async fn insert_at(&self, record: NewRecord, created_at: DateTime<Utc>) -> BillingResult<RecordId> {
        self.state.write().await.insert(record, created_at)
    }

    /// Let `n` more creates succeed, then fail every create.
    pub async fn fail_creates_after(&self, n: usize) {
        self.state.write().await.failures.creates_left = Some(n);
    }

    /// Fail every update.
    pub async fn fail_updates(&self) {
        self.state.write().await.failures.updates = true;
    }

    /// Fail every delete.
    pub async fn fail_deletes(&self) {
        self.state.write().await.failures.deletes = true;
    }

    /// Remove all injected failures.
    pub async fn clear_failures(&self) {
        self.state.write().await.failures = Failures::default();
    }

    /// Look up a record by ID, whatever its marker.
    pub async fn record(&self, id: RecordId) -> Option<PartnerRecord> {
        self.state.read().await.records.get(&id).cloned()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    /// Calls received so far.
    pub async fn calls(&self) -> CallCounts {
        self.state.read().await.calls
    }
}

#[async_trait]
impl RecordSystem for MemoryRecordSystem {
    async fn create(&self, record: NewRecord) -> BillingResult<RecordId> {
        let mut state = self.state.write().await;
        state.calls.create += 1;
        if let Some(left) = state.failures.creates_left.as_mut() {
            if *left == 0 {
                return Err(BillingError::Unavailable("create failed".to_string()));
            }
            *left -= 1;
        }
        state.insert(record, Utc::now())
    }

    async fn update(&self, ids: &[RecordId], patch: &RecordPatch) -> BillingResult<()> {
        let mut state = self.state.write().await;
        state.calls.update += 1;
        if state.failures.updates {
            return Err(BillingError::Unavailable("update failed".to_string()));
        }
        state.ensure_exist(ids)?;

        for id in ids {
            if let Some(record) = state.records.get_mut(id) {
                if let Some(name) = &patch.name {
                    record.name = name.clone();
                }
                if let Some(email) = &patch.email {
                    record.email = Some(email.clone());
                }
                if let Some(marker) = &patch.marker {
                    record.marker = marker.clone();
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, ids: &[RecordId]) -> BillingResult<()> {
        let mut state = self.state.write().await;
        state.calls.delete += 1;
        if state.failures.deletes {
            return Err(BillingError::Unavailable("delete failed".to_string()));
        }
        state.ensure_exist(ids)?;

        for id in ids {
            state.records.remove(id);
        }
        Ok(())
    }

    async fn search(&self, filter: &SearchFilter) -> BillingResult<Vec<PartnerRecord>> {
        let mut state = self.state.write().await;
        state.calls.search += 1;
        Ok(state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let system = MemoryRecordSystem::new();
        let company = system.create(NewRecord::company("Acme Corp", "acme")).await.unwrap();
        let invoice = system
            .create(NewRecord::invoice("Acme Corp", "billing@acme.example", "acme", company))
            .await
            .unwrap();

        assert!(invoice > company);
        assert_eq!(system.record(invoice).await.unwrap().parent_id, Some(company));
        assert_eq!(system.calls().await.create, 2);
    }

    #[tokio::test]
    async fn test_invoice_needs_existing_company() {
        let system = MemoryRecordSystem::new();
        let err = system
            .create(NewRecord::invoice("Acme Corp", "billing@acme.example", "acme", 99))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::RecordNotFound(99)));

        let err = system.create(NewRecord::company(" ", "acme")).await.unwrap_err();
        assert!(matches!(err, BillingError::Rejected(_)));
        assert!(system.is_empty().await);
    }

    #[tokio::test]
    async fn test_batched_delete_is_all_or_nothing() {
        let system = MemoryRecordSystem::new();
        let a = system.create(NewRecord::company("A", "a")).await.unwrap();
        let b = system.create(NewRecord::company("B", "b")).await.unwrap();

        let err = system.delete(&[a, 42, b]).await.unwrap_err();
        assert!(matches!(err, BillingError::RecordNotFound(42)));
        assert_eq!(system.len().await, 2);

        system.delete(&[a, b]).await.unwrap();
        assert!(system.is_empty().await);
    }

    #[tokio::test]
    async fn test_batched_update() {
        let system = MemoryRecordSystem::new();
        let a = system.create(NewRecord::company("A", "a").with_marker("m")).await.unwrap();
        let b = system.create(NewRecord::company("B", "b").with_marker("m")).await.unwrap();

        system.update(&[a, b], &RecordPatch::clear_marker()).await.unwrap();
        assert!(system.search(&SearchFilter::inflight()).await.unwrap().is_empty());
        assert_eq!(system.record(a).await.unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let system = MemoryRecordSystem::new();
        system.fail_creates_after(1).await;

        system.create(NewRecord::company("A", "a")).await.unwrap();
        let err = system.create(NewRecord::company("B", "b")).await.unwrap_err();
        assert_eq!(err.status_code(), 503);

        system.fail_deletes().await;
        assert!(system.delete(&[1]).await.is_err());
        assert_eq!(system.len().await, 1);

        system.clear_failures().await;
        system.create(NewRecord::company("B", "b")).await.unwrap();
        system.delete(&[1]).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_at_back_dates() {
        let system = MemoryRecordSystem::new();
        let created_at = Utc::now() - Duration::hours(2);
        let id = system
            .insert_at(NewRecord::company("Old", "old").with_marker("m"), created_at)
            .await
            .unwrap();

        assert_eq!(system.record(id).await.unwrap().created_at, created_at);
        assert_eq!(system.calls().await.create, 0);
    }
}
