//! Transient run metadata returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::JobRecord;
use super::status::JobStatus;

/// Metadata describing one job run, returned to the caller alongside
/// the typed result. `job_id` is `None` for unpersisted runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Persisted record id, if any.
    pub job_id: Option<Uuid>,
    /// Job definition name.
    pub job_name: String,
    /// When the record was inserted (None for unpersisted runs).
    pub enqueued_at: Option<DateTime<Utc>>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When execution completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Final status of the run.
    pub status: JobStatus,
    /// Execution attempts consumed.
    pub attempt_count: i32,
    /// Error message, if the run failed.
    pub error: Option<String>,
}

impl JobMetadata {
    /// Metadata for an unpersisted (`persist=false`) run.
    pub fn ephemeral(
        job_name: impl Into<String>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        status: JobStatus,
    ) -> Self {
        Self {
            job_id: None,
            job_name: job_name.into(),
            enqueued_at: None,
            started_at: Some(started_at),
            completed_at: Some(completed_at),
            status,
            attempt_count: 1,
            error: None,
        }
    }
}

impl From<&JobRecord> for JobMetadata {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: Some(record.id),
            job_name: record.job_name.clone(),
            enqueued_at: Some(record.created_at),
            started_at: record.worker_started_at,
            completed_at: record.completed_at,
            status: record.status,
            attempt_count: record.attempt_count,
            error: record.error.clone(),
        }
    }
}
