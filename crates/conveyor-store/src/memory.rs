//! In-memory store implementations.
//!
//! Back embedding scenarios that do not need durability (and the
//! engine's own tests). Per-entry mutations go through dashmap's shard
//! locks, so `claim` and `reclaim` keep their compare-and-set
//! semantics within a single process.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;
use conveyor_entity::cron::model::{CronJobRecord, NewCronJob};
use conveyor_entity::cron::schedule::next_fire_after;
use conveyor_entity::job::model::{JobRecord, NewJob};
use conveyor_entity::job::status::JobStatus;

use crate::store::{CronStore, JobStore, ReclaimOutcome, LOCK_EXPIRED_ERROR};

/// In-memory job store.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, JobRecord>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of job records held.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Snapshot all job records, ordered by id (UUIDv7 = creation order).
    pub fn snapshot(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.jobs.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        records
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &NewJob) -> AppResult<JobRecord> {
        let now = Utc::now();
        let record = JobRecord {
            id: Uuid::now_v7(),
            job_name: job.job_name.clone(),
            params: job.params.clone(),
            result: None,
            status: JobStatus::Pending,
            progress: 0,
            progress_message: None,
            error: None,
            worker_started_at: None,
            worker_expires_at: None,
            attempt_count: 0,
            max_attempts: job.max_attempts,
            scheduled_for: job.scheduled_for,
            correlation_id: job.correlation_id.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.jobs.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<JobRecord>> {
        Ok(self.jobs.get(&id).map(|e| e.value().clone()))
    }

    async fn claim(&self, id: Uuid, lock_duration: Duration) -> AppResult<bool> {
        let Some(mut entry) = self.jobs.get_mut(&id) else {
            return Ok(false);
        };
        let record = entry.value_mut();
        if record.status != JobStatus::Pending {
            return Ok(false);
        }

        let now = Utc::now();
        record.status = JobStatus::Running;
        record.worker_started_at = Some(now);
        record.worker_expires_at =
            Some(now + chrono::Duration::milliseconds(lock_duration.as_millis() as i64));
        record.attempt_count += 1;
        record.updated_at = now;
        Ok(true)
    }

    async fn complete(&self, id: Uuid, result: &serde_json::Value) -> AppResult<()> {
        let mut entry = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("job {id} not found")))?;
        let record = entry.value_mut();
        let now = Utc::now();
        record.status = JobStatus::Completed;
        record.result = Some(result.clone());
        record.progress = 100;
        record.error = None;
        record.worker_started_at = None;
        record.worker_expires_at = None;
        record.completed_at = Some(now);
        record.updated_at = now;
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<()> {
        let mut entry = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("job {id} not found")))?;
        let record = entry.value_mut();
        record.status = JobStatus::Failed;
        record.error = Some(error.to_string());
        record.worker_started_at = None;
        record.worker_expires_at = None;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        percent: i32,
        message: Option<&str>,
    ) -> AppResult<()> {
        // Same range the jobs table enforces with a check constraint.
        if !(0..=100).contains(&percent) {
            return Err(AppError::validation(format!(
                "progress {percent} out of range [0, 100]"
            )));
        }
        let mut entry = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("job {id} not found")))?;
        let record = entry.value_mut();
        record.progress = percent;
        if let Some(message) = message {
            record.progress_message = Some(message.to_string());
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find_reclaimable(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|e| e.value().lock_expired(now))
            .map(|e| *e.key())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn reclaim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ReclaimOutcome>> {
        let Some(mut entry) = self.jobs.get_mut(&id) else {
            return Ok(None);
        };
        let record = entry.value_mut();
        if !record.lock_expired(now) {
            return Ok(None);
        }

        record.worker_started_at = None;
        record.worker_expires_at = None;
        record.updated_at = now;
        if record.can_retry() {
            record.status = JobStatus::Pending;
            Ok(Some(ReclaimOutcome::Requeued))
        } else {
            record.status = JobStatus::Failed;
            record.error = Some(LOCK_EXPIRED_ERROR.to_string());
            Ok(Some(ReclaimOutcome::Exhausted))
        }
    }

    async fn purge_terminal(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let before_len = self.jobs.len();
        self.jobs
            .retain(|_, record| !(record.status.is_terminal() && record.updated_at < before));
        Ok((before_len - self.jobs.len()) as u64)
    }
}

/// In-memory cron schedule store.
#[derive(Debug, Default)]
pub struct MemoryCronStore {
    schedules: DashMap<Uuid, CronJobRecord>,
}

impl MemoryCronStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CronStore for MemoryCronStore {
    async fn insert(&self, cron: &NewCronJob) -> AppResult<CronJobRecord> {
        let now = Utc::now();
        let record = CronJobRecord {
            id: Uuid::now_v7(),
            job_name: cron.job_name.clone(),
            cron_expression: cron.cron_expression.clone(),
            params: cron.params.clone(),
            enabled: cron.enabled,
            last_run_at: None,
            next_run_at: next_fire_after(&cron.cron_expression, now)?,
            last_job_id: None,
            created_at: now,
            updated_at: now,
        };
        self.schedules.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CronJobRecord>> {
        Ok(self.schedules.get(&id).map(|e| e.value().clone()))
    }

    async fn list(&self) -> AppResult<Vec<CronJobRecord>> {
        let mut records: Vec<CronJobRecord> =
            self.schedules.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool) -> AppResult<()> {
        let mut entry = self
            .schedules
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("cron job {id} not found")))?;
        let record = entry.value_mut();
        record.enabled = enabled;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<CronJobRecord>> {
        let mut due: Vec<CronJobRecord> = self
            .schedules
            .iter()
            .filter(|e| {
                let record = e.value();
                record.enabled && record.next_run_at.is_some_and(|next| next <= now)
            })
            .map(|e| e.value().clone())
            .collect();
        due.sort_by_key(|r| r.next_run_at);
        Ok(due)
    }

    async fn mark_fired(
        &self,
        id: Uuid,
        last_job_id: Uuid,
        fired_at: DateTime<Utc>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let mut entry = self
            .schedules
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("cron job {id} not found")))?;
        let record = entry.value_mut();
        record.last_run_at = Some(fired_at);
        record.last_job_id = Some(last_job_id);
        record.next_run_at = next_run_at;
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_job(name: &str) -> NewJob {
        NewJob {
            job_name: name.to_string(),
            params: json!({"n": 1}),
            max_attempts: 2,
            scheduled_for: None,
            correlation_id: None,
        }
    }

    #[tokio::test]
    async fn test_claim_is_single_winner() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();

        assert!(store.claim(record.id, Duration::from_secs(60)).await.unwrap());
        assert!(!store.claim(record.id, Duration::from_secs(60)).await.unwrap());

        let claimed = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(claimed.status, JobStatus::Running);
        assert_eq!(claimed.attempt_count, 1);
        assert!(claimed.worker_started_at.is_some());
        assert!(claimed.worker_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_clears_lock_and_sets_progress() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();
        store.claim(record.id, Duration::from_secs(60)).await.unwrap();
        store.complete(record.id, &json!({"ok": true})).await.unwrap();

        let done = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert!(done.completed_at.is_some());
        assert!(done.worker_started_at.is_none());
        assert!(done.worker_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_update_progress_rejects_out_of_range() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();
        store.claim(record.id, Duration::from_secs(60)).await.unwrap();

        assert!(store.update_progress(record.id, 150, None).await.is_err());
        assert!(store.update_progress(record.id, -1, None).await.is_err());
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 0);

        store
            .update_progress(record.id, 55, Some("over halfway"))
            .await
            .unwrap();
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 55);
    }

    #[tokio::test]
    async fn test_reclaim_requeues_when_budget_remains() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();
        store.claim(record.id, Duration::from_millis(0)).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.find_reclaimable(later).await.unwrap(), vec![record.id]);
        assert_eq!(
            store.reclaim(record.id, later).await.unwrap(),
            Some(ReclaimOutcome::Requeued)
        );

        let requeued = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(requeued.status, JobStatus::Pending);
        assert!(requeued.worker_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_reclaim_fails_job_when_budget_exhausted() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();

        // Burn both attempts through expired locks.
        for _ in 0..2 {
            store.claim(record.id, Duration::from_millis(0)).await.unwrap();
            let later = Utc::now() + chrono::Duration::seconds(1);
            store.reclaim(record.id, later).await.unwrap();
        }

        let exhausted = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(exhausted.status, JobStatus::Failed);
        assert_eq!(exhausted.error.as_deref(), Some(LOCK_EXPIRED_ERROR));
        assert_eq!(exhausted.attempt_count, 2);
    }

    #[tokio::test]
    async fn test_reclaim_skips_live_locks() {
        let store = MemoryJobStore::new();
        let record = store.insert(&new_job("demo")).await.unwrap();
        store.claim(record.id, Duration::from_secs(300)).await.unwrap();

        let now = Utc::now();
        assert!(store.find_reclaimable(now).await.unwrap().is_empty());
        assert_eq!(store.reclaim(record.id, now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_terminal_keeps_active_records() {
        let store = MemoryJobStore::new();
        let done = store.insert(&new_job("demo")).await.unwrap();
        store.claim(done.id, Duration::from_secs(60)).await.unwrap();
        store.complete(done.id, &json!({})).await.unwrap();
        let pending = store.insert(&new_job("demo")).await.unwrap();

        let purged = store
            .purge_terminal(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(store.find_by_id(done.id).await.unwrap().is_none());
        assert!(store.find_by_id(pending.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cron_insert_validates_and_seeds_next_run() {
        let store = MemoryCronStore::new();
        let bad = NewCronJob {
            job_name: "demo".to_string(),
            cron_expression: "not a cron".to_string(),
            params: json!({}),
            enabled: true,
        };
        assert!(store.insert(&bad).await.is_err());

        let good = NewCronJob {
            cron_expression: "*/5 * * * *".to_string(),
            ..bad
        };
        let record = store.insert(&good).await.unwrap();
        assert!(record.next_run_at.is_some());

        let due_later = record.next_run_at.unwrap() + chrono::Duration::seconds(1);
        assert_eq!(store.find_due(due_later).await.unwrap().len(), 1);

        store.set_enabled(record.id, false).await.unwrap();
        assert!(store.find_due(due_later).await.unwrap().is_empty());
    }
}
