//! # Platform Billing
//!
//! This crate mirrors billing accounts into an ERP system as linked partner
//! records and cleans up after creations that never finished.
//!
//! ## Overview
//!
//! The platform-billing crate handles:
//! - **Records**: The partner record system contract and an in-memory implementation
//! - **Linked Entities**: Two-phase creation of company and invoice records
//! - **Markers**: Inflight tags identifying unfinished creations
//! - **Scavenging**: Periodic deletion of tagged records past a grace period
//!
//! ## Consistency
//!
//! The record system has no multi-record transaction, so a billing entity is
//! written record by record under one inflight marker and confirmed by
//! clearing it. Readers never see tagged records. A failed creation is not
//! rolled back; its records stay tagged until the [`Scavenger`] removes them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use platform_billing::{BillingDirectory, MemoryRecordSystem, Scavenger, ScavengerConfig};
//! use platform_org::BillingAccount;
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let records = Arc::new(MemoryRecordSystem::new());
//!     let directory = BillingDirectory::new(records.clone());
//!
//!     let mut account = BillingAccount::new("acme", "Acme Corp", "billing@acme.example");
//!     let link = directory.create(&account).await.unwrap();
//!     account.link_erp(link);
//!
//!     let (shutdown, rx) = tokio::sync::watch::channel(false);
//!     let scavenger = Arc::new(Scavenger::new(records, ScavengerConfig::from_env()));
//!     let handle = scavenger.spawn(rx);
//!
//!     // ...
//!
//!     shutdown.send(true).unwrap();
//!     handle.await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod linked;
pub mod marker;
pub mod memory;
pub mod records;
pub mod scavenger;

// Re-export main types for convenience
pub use config::{ConfigError, ScavengerConfig};
pub use error::{BillingError, BillingResult};
pub use linked::{BillingDirectory, BillingEntity};
pub use memory::{CallCounts, MemoryRecordSystem};
pub use records::{
    MarkerFilter, NewRecord, PartnerRecord, RecordId, RecordKind, RecordPatch, RecordSystem, SearchFilter,
};
pub use scavenger::{Scavenger, SweepReport};
