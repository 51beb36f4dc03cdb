//! The runtime state machine.
//!
//! Persisted runs walk `pending → running → {completed, failed}`
//! through the store's atomic operations: insert, claim (which stamps
//! the lock window and burns one attempt), then a terminal write.
//! Errors reach the caller only after the terminal state is durably
//! written.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;
use conveyor_core::validate::validate_fields;
use conveyor_entity::job::metadata::JobMetadata;
use conveyor_entity::job::model::NewJob;
use conveyor_entity::job::status::JobStatus;

use crate::context::JobContext;
use crate::definition::{JobParams, JobResultValue, JobType};

/// Options for [`JobType::now`].
#[derive(Debug, Clone)]
pub struct NowOptions {
    /// Persist a record for this run (default true).
    pub persist: bool,
    /// Worker-lock duration override (must be non-zero); `None` uses
    /// the definition's.
    pub worker_timeout: Option<Duration>,
    /// Caller-supplied correlation identifier.
    pub correlation_id: Option<String>,
}

impl Default for NowOptions {
    fn default() -> Self {
        Self {
            persist: true,
            worker_timeout: None,
            correlation_id: None,
        }
    }
}

/// Options for [`JobType::later_with`].
#[derive(Debug, Clone, Default)]
pub struct LaterOptions {
    /// Earliest time the job should run.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Caller-supplied correlation identifier.
    pub correlation_id: Option<String>,
}

/// A finished run: the typed result plus run metadata.
#[derive(Debug, Clone)]
pub struct JobOutcome<R> {
    /// The handler's validated result.
    pub data: R,
    /// Lifecycle metadata for the run.
    pub metadata: JobMetadata,
}

impl<P: JobParams, R: JobResultValue> JobType<P, R> {
    /// Execute immediately and wait for the result.
    ///
    /// Params are validated first, reporting every failing field. With
    /// `persist=false` the handler runs directly and no record is
    /// created; otherwise the full insert → claim → run → terminal-write
    /// sequence applies.
    pub async fn now(&self, params: P, options: NowOptions) -> AppResult<JobOutcome<R>> {
        validate_fields("params", &params)?;
        // A zero lock would be born expired; same guard as the
        // definition builder.
        if options.worker_timeout.is_some_and(|t| t.is_zero()) {
            return Err(AppError::configuration(
                "worker_timeout override must be non-zero",
            ));
        }

        if !options.persist {
            return self.run_unpersisted(params).await;
        }

        let new_job = NewJob {
            job_name: self.name().to_string(),
            params: serde_json::to_value(&params)?,
            max_attempts: self.definition.max_attempts(),
            scheduled_for: None,
            correlation_id: options.correlation_id,
        };
        let record = self.store.insert(&new_job).await?;

        let lock_duration = options
            .worker_timeout
            .unwrap_or_else(|| self.definition.worker_timeout());
        self.claim_or_contend(record.id, lock_duration).await?;

        self.run_claimed(record.id, params, Utc::now()).await
    }

    /// Enqueue for asynchronous execution; never runs the handler.
    pub async fn later(&self, params: P) -> AppResult<Uuid> {
        self.later_with(params, LaterOptions::default()).await
    }

    /// Enqueue with scheduling options; never runs the handler.
    ///
    /// Validation errors propagate before any record is persisted.
    pub async fn later_with(&self, params: P, options: LaterOptions) -> AppResult<Uuid> {
        validate_fields("params", &params)?;

        let new_job = NewJob {
            job_name: self.name().to_string(),
            params: serde_json::to_value(&params)?,
            max_attempts: self.definition.max_attempts(),
            scheduled_for: options.scheduled_for,
            correlation_id: options.correlation_id,
        };
        let record = self.store.insert(&new_job).await?;

        tracing::debug!(
            job_id = %record.id,
            job_name = %record.job_name,
            scheduled_for = ?record.scheduled_for,
            "Enqueued job"
        );
        Ok(record.id)
    }

    /// Execute a previously persisted record: the path a generic
    /// worker takes after dequeuing an id.
    ///
    /// Stored params are re-validated defensively; corrupt or invalid
    /// params mark the record failed. A lost claim surfaces as
    /// `LockContention`, which worker loops treat as "skip".
    pub async fn execute_from_database(&self, job_id: Uuid) -> AppResult<JobOutcome<R>> {
        let record = self
            .store
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("job {job_id} not found")))?;

        if record.job_name != self.name() {
            return Err(AppError::conflict(format!(
                "job {job_id} belongs to '{}', not '{}'",
                record.job_name,
                self.name()
            )));
        }

        let params: P = match serde_json::from_value(record.params.clone()) {
            Ok(params) => params,
            Err(e) => {
                let err =
                    AppError::validation(format!("stored params failed to deserialize: {e}"));
                self.store.fail(job_id, &err.message).await?;
                return Err(err);
            }
        };
        if let Err(err) = validate_fields("params", &params) {
            self.store.fail(job_id, &err.message).await?;
            return Err(err);
        }

        self.claim_or_contend(job_id, self.definition.worker_timeout())
            .await?;

        self.run_claimed(job_id, params, Utc::now()).await
    }

    async fn claim_or_contend(&self, job_id: Uuid, lock_duration: Duration) -> AppResult<()> {
        if self.store.claim(job_id, lock_duration).await? {
            Ok(())
        } else {
            Err(AppError::lock_contention(format!(
                "job {job_id} was not claimable (lost to another worker or not pending)"
            )))
        }
    }

    /// Run the handler for a claimed record and write the terminal
    /// state. The terminal write always lands before any error reaches
    /// the caller.
    async fn run_claimed(
        &self,
        job_id: Uuid,
        params: P,
        started_at: DateTime<Utc>,
    ) -> AppResult<JobOutcome<R>> {
        let ctx = JobContext::persisted(job_id, self.name().to_string(), self.store().clone());
        let data = match (self.handler())(params, ctx).await {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(
                    job_id = %job_id,
                    job_name = %self.name(),
                    "Job handler failed: {err}"
                );
                self.store.fail(job_id, &err.message).await?;
                return Err(err);
            }
        };

        if let Err(err) = validate_fields("result", &data) {
            self.store.fail(job_id, &err.message).await?;
            return Err(err);
        }
        let result_json = match serde_json::to_value(&data) {
            Ok(json) => json,
            Err(e) => {
                let err = AppError::from(e);
                self.store.fail(job_id, &err.message).await?;
                return Err(err);
            }
        };

        self.store.complete(job_id, &result_json).await?;

        let record = self
            .store
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("job {job_id} vanished after completion")))?;
        let mut metadata = JobMetadata::from(&record);
        // complete() clears the lock window, so restore the observed
        // claim time for the caller.
        metadata.started_at = Some(started_at);

        tracing::debug!(
            job_id = %job_id,
            job_name = %self.name(),
            attempt_count = record.attempt_count,
            "Job completed"
        );
        Ok(JobOutcome { data, metadata })
    }

    async fn run_unpersisted(&self, params: P) -> AppResult<JobOutcome<R>> {
        let started_at = Utc::now();
        let ctx = JobContext::unpersisted(self.name().to_string(), self.store().clone());
        let data = (self.handler())(params, ctx).await?;
        validate_fields("result", &data)?;

        let metadata = JobMetadata::ephemeral(
            self.name(),
            started_at,
            Utc::now(),
            JobStatus::Completed,
        );
        Ok(JobOutcome { data, metadata })
    }
}
