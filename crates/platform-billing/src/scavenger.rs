//! Deferred cleanup of abandoned billing records
//!
//! Each sweep is one pass: search every record still carrying an inflight
//! marker, keep those created strictly before `now - grace`, and delete them
//! in a single batched call. If that call fails the sweep fails as a whole,
//! with no per-record accounting; the next sweep sees the same records again.
//!
//! Sweeps must not overlap. [`Scavenger::run`] sweeps sequentially, but
//! nothing stops two processes from sweeping the same record system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::config::ScavengerConfig;
use crate::error::BillingResult;
use crate::records::{RecordId, RecordSystem, SearchFilter};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Tagged records found.
    pub examined: usize,
    /// Tagged records deleted.
    pub deleted: usize,
    /// Tagged records still within the grace period.
    pub retained: usize,
}

/// Deletes records abandoned by incomplete creations.
pub struct Scavenger {
    records: Arc<dyn RecordSystem>,
    config: ScavengerConfig,
}

impl Scavenger {
    /// Create a scavenger over `records`.
    pub fn new(records: Arc<dyn RecordSystem>, config: ScavengerConfig) -> Self {
        Self { records, config }
    }

    /// Scavenger configuration.
    pub fn config(&self) -> &ScavengerConfig {
        &self.config
    }

    /// Sweep once, now.
    pub async fn sweep(&self) -> BillingResult<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep once as of `now`.
    #[instrument(skip(self), fields(grace_secs = self.config.grace_period_secs))]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> BillingResult<SweepReport> {
        let cutoff = now - self.config.grace_period();
        let tagged = self.records.search(&SearchFilter::inflight()).await?;

        let stale: Vec<RecordId> = tagged
            .iter()
            .filter(|record| record.created_at < cutoff)
            .map(|record| record.id)
            .collect();
        let report = SweepReport {
            examined: tagged.len(),
            deleted: stale.len(),
            retained: tagged.len() - stale.len(),
        };

        if stale.is_empty() {
            debug!(retained = report.retained, "Nothing to scavenge");
            return Ok(report);
        }

        if let Err(e) = self.records.delete(&stale).await {
            error!(error = %e, records = stale.len(), "Scavenger delete failed");
            return Err(e);
        }

        info!(
            examined = report.examined,
            deleted = report.deleted,
            retained = report.retained,
            "Sweep completed"
        );
        Ok(report)
    }

    /// Sweep every interval until `shutdown` turns `true` or its sender is
    /// dropped. The first sweep runs immediately. Failed sweeps are logged.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.enabled {
            info!("Scavenger disabled");
            return;
        }

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.config.interval_secs, "Scavenger started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "Sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scavenger stopped");
    }

    /// Run on a background task.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

impl std::fmt::Debug for Scavenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scavenger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
