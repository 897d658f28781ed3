//! Billing entities as linked partner records
//!
//! A billing entity is written as two records, company then invoice address,
//! in a record system with no multi-record transaction. Creation tags both
//! records with one inflight marker and clears it on both in a single update
//! once both exist:
//!
//! ```text
//! create(company, marker)  ─┐
//! create(invoice, marker)   ├─ a failure here leaves tagged records behind
//! update([company, invoice], marker = "")
//! ```
//!
//! Nothing is compensated synchronously; a failed creation only logs the
//! records it left behind. Reads skip tagged records and
//! incomplete pairs, and the [`Scavenger`](crate::Scavenger) deletes tagged
//! records once they are older than the grace period.

use platform_org::{BillingAccount, ErpLink};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{BillingError, BillingResult};
use crate::marker::new_marker;
use crate::records::{NewRecord, PartnerRecord, RecordId, RecordKind, RecordPatch, RecordSystem, SearchFilter};

/// A confirmed company record and its invoice-address record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingEntity {
    /// Company record
    pub company: PartnerRecord,
    /// Invoice-address record
    pub invoice: PartnerRecord,
}

impl BillingEntity {
    /// IDs of both records.
    pub fn link(&self) -> ErpLink {
        ErpLink {
            company_id: self.company.id,
            invoice_id: self.invoice.id,
        }
    }

    /// Organization the entity bills.
    pub fn organization(&self) -> &str {
        &self.company.reference
    }
}

/// Creates and reads billing entities in a [`RecordSystem`].
pub struct BillingDirectory {
    records: Arc<dyn RecordSystem>,
}

impl BillingDirectory {
    /// Create a directory over `records`.
    pub fn new(records: Arc<dyn RecordSystem>) -> Self {
        Self { records }
    }

    /// Write the partner records for `account`.
    ///
    /// On error, records written so far stay tagged and invisible to reads.
    #[instrument(skip_all, fields(organization = %account.organization))]
    pub async fn create(&self, account: &BillingAccount) -> BillingResult<ErpLink> {
        let marker = new_marker();
        match self.create_tagged(account, &marker).await {
            Ok(link) => {
                debug!(
                    company_id = link.company_id,
                    invoice_id = link.invoice_id,
                    "Billing entity created"
                );
                Ok(link)
            }
            Err(e) => {
                let leftovers = self.leftovers(&marker).await;
                warn!(
                    error = %e,
                    leftovers = ?leftovers,
                    "Billing entity creation incomplete, records left inflight"
                );
                Err(e)
            }
        }
    }

    /// IDs of records still tagged with `marker`. Lookup failures yield none.
    async fn leftovers(&self, marker: &str) -> Vec<RecordId> {
        match self.records.search(&SearchFilter::tagged(marker)).await {
            Ok(records) => records.into_iter().map(|r| r.id).collect(),
            Err(e) => {
                debug!(error = %e, "Could not look up inflight records");
                Vec::new()
            }
        }
    }

    async fn create_tagged(&self, account: &BillingAccount, marker: &str) -> BillingResult<ErpLink> {
        let company_id = self
            .records
            .create(NewRecord::company(&account.legal_name, &account.organization).with_marker(marker))
            .await?;
        let invoice_id = self
            .records
            .create(
                NewRecord::invoice(
                    &account.legal_name,
                    &account.billing_email,
                    &account.organization,
                    company_id,
                )
                .with_marker(marker),
            )
            .await?;

        self.records
            .update(&[company_id, invoice_id], &RecordPatch::clear_marker())
            .await?;

        Ok(ErpLink {
            company_id,
            invoice_id,
        })
    }

    /// Read the entity behind `link`.
    ///
    /// Returns `EntityNotFound` unless both records exist, are confirmed and
    /// are linked to each other.
    pub async fn get(&self, link: ErpLink) -> BillingResult<BillingEntity> {
        let not_found = || BillingError::EntityNotFound(link.company_id);

        let company = self
            .records
            .search(
                &SearchFilter::confirmed()
                    .with_kind(RecordKind::Company)
                    .with_ids(vec![link.company_id]),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(not_found)?;

        let invoice = self
            .records
            .search(
                &SearchFilter::confirmed()
                    .with_kind(RecordKind::Invoice)
                    .with_parent(link.company_id)
                    .with_ids(vec![link.invoice_id]),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(not_found)?;

        Ok(BillingEntity { company, invoice })
    }

    /// Every complete, confirmed entity, by company record ID.
    pub async fn list(&self) -> BillingResult<Vec<BillingEntity>> {
        let records = self.records.search(&SearchFilter::confirmed()).await?;

        let mut companies = BTreeMap::new();
        let mut invoices = Vec::new();
        for record in records {
            match record.kind {
                RecordKind::Company => {
                    companies.insert(record.id, record);
                }
                RecordKind::Invoice => invoices.push(record),
            }
        }

        let mut paired: BTreeMap<_, BillingEntity> = BTreeMap::new();
        for invoice in invoices {
            let Some(company_id) = invoice.parent_id else {
                continue;
            };
            if paired.contains_key(&company_id) {
                continue;
            }
            if let Some(company) = companies.get(&company_id) {
                paired.insert(
                    company_id,
                    BillingEntity {
                        company: company.clone(),
                        invoice,
                    },
                );
            }
        }

        Ok(paired.into_values().collect())
    }
}

impl std::fmt::Debug for BillingDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingDirectory").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecordSystem;

    fn account(org: &str) -> BillingAccount {
        BillingAccount::new(org, format!("{org} Inc"), format!("billing@{org}.example"))
    }

    fn directory() -> (Arc<MemoryRecordSystem>, BillingDirectory) {
        let system = Arc::new(MemoryRecordSystem::new());
        (system.clone(), BillingDirectory::new(system))
    }

    #[tokio::test]
    async fn test_create_confirms_both_records() {
        let (system, directory) = directory();
        let link = directory.create(&account("acme")).await.unwrap();

        let entity = directory.get(link).await.unwrap();
        assert_eq!(entity.organization(), "acme");
        assert_eq!(entity.invoice.parent_id, Some(link.company_id));
        assert_eq!(entity.invoice.email.as_deref(), Some("billing@acme.example"));
        assert!(!entity.company.is_inflight());
        assert!(!entity.invoice.is_inflight());

        // Both markers cleared by one batched update.
        assert_eq!(system.calls().await.update, 1);
    }

    #[tokio::test]
    async fn test_second_write_failure_leaves_tagged_company() {
        let (system, directory) = directory();
        system.fail_creates_after(1).await;

        assert!(directory.create(&account("acme")).await.is_err());

        let tagged = system.search(&SearchFilter::inflight()).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].kind, RecordKind::Company);

        // The failed creation looked up what it left behind under its marker.
        assert_eq!(system.calls().await.search, 2);
        assert_eq!(system.search(&SearchFilter::tagged(&tagged[0].marker)).await.unwrap(), tagged);
        assert!(directory.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_confirmation_hides_entity() {
        let (system, directory) = directory();
        system.fail_updates().await;

        assert!(directory.create(&account("acme")).await.is_err());
        assert_eq!(system.len().await, 2);

        let link = ErpLink {
            company_id: 1,
            invoice_id: 2,
        };
        assert!(matches!(directory.get(link).await, Err(BillingError::EntityNotFound(1))));
        assert!(directory.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_incomplete_pairs() {
        let (system, directory) = directory();
        let acme = directory.create(&account("acme")).await.unwrap();
        let globex = directory.create(&account("globex")).await.unwrap();

        // A confirmed company whose invoice record is still tagged.
        let lonely = system.create(NewRecord::company("Initech", "initech")).await.unwrap();
        system
            .create(NewRecord::invoice("Initech", "billing@initech.example", "initech", lonely).with_marker("m"))
            .await
            .unwrap();

        let links: Vec<_> = directory.list().await.unwrap().iter().map(BillingEntity::link).collect();
        assert_eq!(links, vec![acme, globex]);
    }

    #[tokio::test]
    async fn test_get_rejects_mismatched_link() {
        let (_, directory) = directory();
        let acme = directory.create(&account("acme")).await.unwrap();
        let globex = directory.create(&account("globex")).await.unwrap();

        let crossed = ErpLink {
            company_id: acme.company_id,
            invoice_id: globex.invoice_id,
        };
        assert!(directory.get(crossed).await.unwrap_err().is_not_found());
    }
}
