// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic deletion of rows nobody will render again.
//!
//! Runs outside the queue. Message identities go with their tracked objects
//! through the foreign key cascade; their chat messages are left in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use octorelay_config::model::GcConfig;
use octorelay_core::types::TrackedKind;
use octorelay_core::{Broker, RelayError, RelayStore};

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;
/// Longer retentions are treated as this one; SQLite date arithmetic has a
/// limited range.
const MAX_RETENTION_SECS: u64 = 100 * 365 * DAY;

fn retention_secs(count: u64, unit: u64) -> u64 {
    count.saturating_mul(unit).min(MAX_RETENTION_SECS)
}

/// Rows removed by one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    pub pushes: usize,
    pub check_suites: usize,
    pub issues: usize,
    pub pull_requests: usize,
    pub abandoned_claims: usize,
    pub queue_rows: usize,
}

impl GcReport {
    pub fn total(&self) -> usize {
        self.pushes
            + self.check_suites
            + self.issues
            + self.pull_requests
            + self.abandoned_claims
            + self.queue_rows
    }
}

pub struct GarbageCollector {
    store: Arc<dyn RelayStore>,
    broker: Arc<dyn Broker>,
    config: GcConfig,
    claim_ttl_secs: u64,
}

impl GarbageCollector {
    pub fn new(
        store: Arc<dyn RelayStore>,
        broker: Arc<dyn Broker>,
        config: GcConfig,
        claim_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            broker,
            config,
            claim_ttl_secs,
        }
    }

    /// Runs one pass over every retention rule.
    pub async fn collect(&self) -> Result<GcReport, RelayError> {
        let config = &self.config;
        let store = &self.store;
        let report = GcReport {
            pushes: store
                .delete_stale_tracked(
                    TrackedKind::Push,
                    retention_secs(config.push_retention_hours, HOUR),
                )
                .await?,
            check_suites: store
                .delete_stale_tracked(
                    TrackedKind::CheckSuite,
                    retention_secs(config.check_suite_retention_hours, HOUR),
                )
                .await?,
            issues: store
                .delete_stale_tracked(
                    TrackedKind::Issue,
                    retention_secs(config.issue_retention_days, DAY),
                )
                .await?,
            pull_requests: store
                .delete_stale_tracked(
                    TrackedKind::PullRequest,
                    retention_secs(config.issue_retention_days, DAY),
                )
                .await?,
            abandoned_claims: store.delete_abandoned_claims(self.claim_ttl_secs).await?,
            queue_rows: self
                .broker
                .purge_settled(Duration::from_secs(retention_secs(
                    config.queue_retention_hours,
                    HOUR,
                )))
                .await?,
        };
        Ok(report)
    }

    /// Spawns the collection loop. The first pass runs one interval after
    /// start; the task ends when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
            interval.tick().await;
            info!(interval_secs = self.config.interval_secs, "garbage collector started");

            loop {
                tokio::select! {
                    _ = interval.tick() => match self.collect().await {
                        Ok(report) if report.total() > 0 => info!(?report, "garbage collected"),
                        Ok(_) => debug!("nothing to collect"),
                        Err(e) => warn!(error = %e, "garbage collection failed"),
                    },
                    _ = cancel.cancelled() => {
                        info!("garbage collector shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_retentions_saturate() {
        assert_eq!(retention_secs(2, HOUR), 7200);
        assert_eq!(retention_secs(u64::MAX, HOUR), MAX_RETENTION_SECS);
        assert_eq!(retention_secs(u64::MAX / 2, DAY), MAX_RETENTION_SECS);
    }
}
