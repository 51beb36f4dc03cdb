//! Cron schedule record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted cron schedule.
///
/// The record is bookkeeping consumed by an external timer loop: the
/// loop reads due rows, spawns the named job with the default params,
/// and writes back `last_run_at` / `next_run_at` / `last_job_id`.
/// `last_job_id` is a back-reference, not ownership: the spawned job
/// lives its own lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CronJobRecord {
    /// Unique schedule identifier.
    pub id: Uuid,
    /// Name of the job definition to spawn.
    pub job_name: String,
    /// Five-field cron expression, validated at insert.
    pub cron_expression: String,
    /// Default params for spawned jobs.
    pub params: serde_json::Value,
    /// Disabled rows are skipped by the timer loop.
    pub enabled: bool,
    /// When the schedule last fired.
    pub last_run_at: Option<DateTime<Utc>>,
    /// When the schedule should next fire.
    pub next_run_at: Option<DateTime<Utc>>,
    /// Id of the most recently spawned job.
    pub last_job_id: Option<Uuid>,
    /// When the schedule was created.
    pub created_at: DateTime<Utc>,
    /// When the schedule was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new cron schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCronJob {
    /// Name of the job definition to spawn.
    pub job_name: String,
    /// Five-field cron expression.
    pub cron_expression: String,
    /// Default params for spawned jobs.
    pub params: serde_json::Value,
    /// Whether the schedule starts enabled.
    pub enabled: bool,
}
