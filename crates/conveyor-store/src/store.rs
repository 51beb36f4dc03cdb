//! Store contracts for job and cron persistence.
//!
//! The job row is the coordination point between workers: correctness
//! of the whole engine rests on `claim` and `reclaim` being single
//! conditional updates, so two workers can never both win the same
//! record.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use conveyor_core::result::AppResult;
use conveyor_entity::cron::model::{CronJobRecord, NewCronJob};
use conveyor_entity::job::model::{JobRecord, NewJob};

/// Sentinel error recorded on jobs whose worker lock expired after the
/// retry budget was exhausted.
pub const LOCK_EXPIRED_ERROR: &str = "worker lock expired; retry attempts exhausted";

/// Result of reclaiming one expired-lock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Retry budget remained; the job is pending again.
    Requeued,
    /// Retry budget exhausted; the job was forced to failed.
    Exhausted,
}

/// Durable job record store.
///
/// Implementations must make `claim` and `reclaim` atomic
/// compare-and-set operations on the status and lock columns.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Insert a new pending record and return it.
    async fn insert(&self, job: &NewJob) -> AppResult<JobRecord>;

    /// Find a record by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<JobRecord>>;

    /// Claim a pending record for execution.
    ///
    /// Sets status to running, stamps the lock window
    /// (`worker_started_at` = now, `worker_expires_at` = now +
    /// `lock_duration`), and increments `attempt_count`, all in one
    /// conditional update that requires the current status to be
    /// pending. Returns `false` when the record was not claimable
    /// (missing, already running under a live lock, or terminal).
    async fn claim(&self, id: Uuid, lock_duration: Duration) -> AppResult<bool>;

    /// Write the successful terminal state: completed, result stored,
    /// progress forced to 100, lock cleared, `completed_at` stamped.
    async fn complete(&self, id: Uuid, result: &serde_json::Value) -> AppResult<()>;

    /// Write the failed terminal state: failed, error recorded, lock
    /// cleared.
    async fn fail(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Record progress for a running job. `percent` outside `[0, 100]`
    /// is rejected.
    async fn update_progress(&self, id: Uuid, percent: i32, message: Option<&str>)
        -> AppResult<()>;

    /// Ids of running records whose lock expired before `now`.
    async fn find_reclaimable(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>>;

    /// Reclaim one expired-lock record: back to pending when the retry
    /// budget remains, else failed with [`LOCK_EXPIRED_ERROR`]. One
    /// conditional update; `None` when the record was not reclaimable
    /// (already reclaimed, completed, or its lock is live again).
    async fn reclaim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ReclaimOutcome>>;

    /// Delete terminal records last updated before `before`. The engine
    /// never calls this; it exists for host-driven retention.
    async fn purge_terminal(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Cron schedule bookkeeping store, consumed by an external timer loop.
#[async_trait]
pub trait CronStore: Send + Sync + std::fmt::Debug {
    /// Insert a new schedule. The cron expression is validated (and
    /// `next_run_at` seeded) before anything is persisted.
    async fn insert(&self, cron: &NewCronJob) -> AppResult<CronJobRecord>;

    /// Find a schedule by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CronJobRecord>>;

    /// List all schedules.
    async fn list(&self) -> AppResult<Vec<CronJobRecord>>;

    /// Enable or disable a schedule. Disabled rows are skipped by the
    /// timer loop.
    async fn set_enabled(&self, id: Uuid, enabled: bool) -> AppResult<()>;

    /// Enabled schedules due at or before `now`.
    async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<CronJobRecord>>;

    /// Record a fire: stamps `last_run_at`, back-references the spawned
    /// job, and advances `next_run_at`.
    async fn mark_fired(
        &self,
        id: Uuid,
        last_job_id: Uuid,
        fired_at: DateTime<Utc>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;
}
