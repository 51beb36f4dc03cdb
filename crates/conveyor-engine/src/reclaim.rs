//! Expired-lock reclaim sweep.
//!
//! The failure-recovery mechanism: a worker that crashed mid-run leaves
//! its record running with an expired lock. Sweeping returns such
//! records to pending while the retry budget lasts, then forces them to
//! failed, so work survives worker crashes without unbounded retries
//! against poison inputs. The sweep is idempotent and safe to run from
//! any number of hosts on any cadence.

use chrono::{DateTime, Utc};

use conveyor_core::result::AppResult;
use conveyor_store::{JobStore, ReclaimOutcome};

/// Counts from one reclaim sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Jobs returned to pending.
    pub requeued: usize,
    /// Jobs forced to failed after exhausting their retry budget.
    pub exhausted: usize,
}

/// Sweep all running records whose worker lock expired before `now`.
pub async fn reclaim_expired(store: &dyn JobStore, now: DateTime<Utc>) -> AppResult<ReclaimReport> {
    let ids = store.find_reclaimable(now).await?;
    let mut report = ReclaimReport::default();

    for id in ids {
        // The per-record reclaim re-checks the condition, so a record
        // another worker claimed between scan and sweep is skipped.
        match store.reclaim(id, now).await? {
            Some(ReclaimOutcome::Requeued) => {
                tracing::info!(job_id = %id, "Reclaimed expired job, requeued");
                report.requeued += 1;
            }
            Some(ReclaimOutcome::Exhausted) => {
                tracing::warn!(job_id = %id, "Reclaimed expired job, retries exhausted");
                report.exhausted += 1;
            }
            None => {}
        }
    }

    if report != ReclaimReport::default() {
        tracing::info!(
            requeued = report.requeued,
            exhausted = report.exhausted,
            "Reclaim sweep finished"
        );
    }
    Ok(report)
}
