//! PostgreSQL cron schedule store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use conveyor_core::error::{AppError, ErrorKind};
use conveyor_core::result::AppResult;
use conveyor_entity::cron::model::{CronJobRecord, NewCronJob};
use conveyor_entity::cron::schedule::next_fire_after;

use crate::store::CronStore;

/// Cron schedule store backed by the `cron_jobs` table.
#[derive(Debug, Clone)]
pub struct PgCronStore {
    pool: PgPool,
}

impl PgCronStore {
    /// Create a new cron store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CronStore for PgCronStore {
    async fn insert(&self, cron: &NewCronJob) -> AppResult<CronJobRecord> {
        // Validates the expression and seeds next_run_at before any
        // database write.
        let next_run_at = next_fire_after(&cron.cron_expression, Utc::now())?;

        sqlx::query_as::<_, CronJobRecord>(
            "INSERT INTO cron_jobs (id, job_name, cron_expression, params, enabled, next_run_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&cron.job_name)
        .bind(&cron.cron_expression)
        .bind(&cron.params)
        .bind(cron.enabled)
        .bind(next_run_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert cron job", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CronJobRecord>> {
        sqlx::query_as::<_, CronJobRecord>("SELECT * FROM cron_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find cron job", e))
    }

    async fn list(&self) -> AppResult<Vec<CronJobRecord>> {
        sqlx::query_as::<_, CronJobRecord>("SELECT * FROM cron_jobs ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list cron jobs", e))
    }

    async fn set_enabled(&self, id: Uuid, enabled: bool) -> AppResult<()> {
        sqlx::query("UPDATE cron_jobs SET enabled = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update cron job", e)
            })?;
        Ok(())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> AppResult<Vec<CronJobRecord>> {
        sqlx::query_as::<_, CronJobRecord>(
            "SELECT * FROM cron_jobs WHERE enabled AND next_run_at IS NOT NULL \
             AND next_run_at <= $1 ORDER BY next_run_at ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find due cron jobs", e))
    }

    async fn mark_fired(
        &self,
        id: Uuid,
        last_job_id: Uuid,
        fired_at: DateTime<Utc>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE cron_jobs SET last_run_at = $2, last_job_id = $3, next_run_at = $4, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(fired_at)
        .bind(last_job_id)
        .bind(next_run_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark cron job fired", e)
        })?;
        Ok(())
    }
}
