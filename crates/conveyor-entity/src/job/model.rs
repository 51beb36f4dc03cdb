//! Job record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::JobStatus;

/// A persisted background job.
///
/// The row is the single source of truth for the job lifecycle and is
/// mutated only through the store's atomic operations. Handlers never
/// write these columns directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRecord {
    /// Time-ordered unique identifier (UUIDv7).
    pub id: Uuid,
    /// Name of the job definition that owns this record.
    pub job_name: String,
    /// Serialized params (JSON), opaque to the store.
    pub params: serde_json::Value,
    /// Serialized result (JSON), null until completion.
    pub result: Option<serde_json::Value>,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Completion percentage, always within `[0, 100]`.
    pub progress: i32,
    /// Optional human-readable progress message.
    pub progress_message: Option<String>,
    /// Error message on failure.
    pub error: Option<String>,
    /// When the current worker claimed the job.
    pub worker_started_at: Option<DateTime<Utc>>,
    /// When the current worker lock expires.
    pub worker_expires_at: Option<DateTime<Utc>>,
    /// Number of execution attempts so far.
    pub attempt_count: i32,
    /// Maximum allowed execution attempts.
    pub max_attempts: i32,
    /// Earliest time the job should run (None = immediately).
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Caller-supplied correlation identifier.
    pub correlation_id: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the job completed successfully.
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Whether the record holds a worker lock that has expired.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running
            && self.worker_expires_at.is_some_and(|expires| expires < now)
    }

    /// Whether the record holds a live (unexpired) worker lock.
    pub fn has_live_lock(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running
            && self.worker_expires_at.is_some_and(|expires| expires >= now)
    }

    /// Whether the retry budget allows another execution attempt.
    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_attempts
    }
}

/// Data required to insert a new job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    /// Name of the owning job definition.
    pub job_name: String,
    /// Serialized params.
    pub params: serde_json::Value,
    /// Maximum execution attempts.
    pub max_attempts: i32,
    /// Earliest execution time.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Caller-supplied correlation identifier.
    pub correlation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: JobStatus, expires: Option<DateTime<Utc>>) -> JobRecord {
        let now = Utc::now();
        JobRecord {
            id: Uuid::now_v7(),
            job_name: "test".to_string(),
            params: serde_json::json!({}),
            result: None,
            status,
            progress: 0,
            progress_message: None,
            error: None,
            worker_started_at: expires.map(|e| e - Duration::minutes(5)),
            worker_expires_at: expires,
            attempt_count: 1,
            max_attempts: 3,
            scheduled_for: None,
            correlation_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_lock_expiry() {
        let now = Utc::now();
        let expired = record(JobStatus::Running, Some(now - Duration::seconds(1)));
        assert!(expired.lock_expired(now));
        assert!(!expired.has_live_lock(now));

        let live = record(JobStatus::Running, Some(now + Duration::minutes(1)));
        assert!(!live.lock_expired(now));
        assert!(live.has_live_lock(now));

        let pending = record(JobStatus::Pending, None);
        assert!(!pending.lock_expired(now));
        assert!(!pending.has_live_lock(now));
    }

    #[test]
    fn test_retry_budget() {
        let mut job = record(JobStatus::Running, None);
        assert!(job.can_retry());
        job.attempt_count = 3;
        assert!(!job.can_retry());
    }
}
