//! PostgreSQL job store implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use conveyor_core::error::{AppError, ErrorKind};
use conveyor_core::result::AppResult;
use conveyor_entity::job::model::{JobRecord, NewJob};
use conveyor_entity::job::status::JobStatus;

use crate::store::{JobStore, ReclaimOutcome, LOCK_EXPIRED_ERROR};

/// Job store backed by the `jobs` table.
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Create a new job store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, job: &NewJob) -> AppResult<JobRecord> {
        // Ids are UUIDv7 so records sort by creation time.
        sqlx::query_as::<_, JobRecord>(
            "INSERT INTO jobs (id, job_name, params, max_attempts, scheduled_for, correlation_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&job.job_name)
        .bind(&job.params)
        .bind(job.max_attempts)
        .bind(job.scheduled_for)
        .bind(&job.correlation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert job", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<JobRecord>> {
        sqlx::query_as::<_, JobRecord>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    async fn claim(&self, id: Uuid, lock_duration: Duration) -> AppResult<bool> {
        // Single conditional update so two workers can never both win.
        let result = sqlx::query(
            "UPDATE jobs SET status = 'running', \
             worker_started_at = NOW(), \
             worker_expires_at = NOW() + $2::double precision * INTERVAL '1 millisecond', \
             attempt_count = attempt_count + 1, \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(lock_duration.as_millis() as f64)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete(&self, id: Uuid, result: &serde_json::Value) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $2, progress = 100, error = NULL, \
             worker_started_at = NULL, worker_expires_at = NULL, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', error = $2, \
             worker_started_at = NULL, worker_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job as failed", e)
        })?;
        Ok(())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        percent: i32,
        message: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET progress = $2, \
             progress_message = COALESCE($3, progress_message), \
             updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(percent)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update progress", e))?;
        Ok(())
    }

    async fn find_reclaimable(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM jobs WHERE status = 'running' AND worker_expires_at < $1 \
             ORDER BY worker_expires_at ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find reclaimable jobs", e)
        })
    }

    async fn reclaim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ReclaimOutcome>> {
        let status = sqlx::query_scalar::<_, JobStatus>(
            "UPDATE jobs SET \
             status = CASE WHEN attempt_count < max_attempts \
                 THEN 'pending'::job_status ELSE 'failed'::job_status END, \
             error = CASE WHEN attempt_count < max_attempts THEN error ELSE $2 END, \
             worker_started_at = NULL, worker_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running' AND worker_expires_at < $3 \
             RETURNING status",
        )
        .bind(id)
        .bind(LOCK_EXPIRED_ERROR)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reclaim job", e))?;

        Ok(status.map(|s| match s {
            JobStatus::Pending => ReclaimOutcome::Requeued,
            _ => ReclaimOutcome::Exhausted,
        }))
    }

    async fn purge_terminal(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM jobs WHERE status IN ('completed', 'failed') AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge jobs", e))?;
        Ok(result.rows_affected())
    }
}
