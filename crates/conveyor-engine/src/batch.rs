//! Bounded batch execution.
//!
//! A batch partitions its params into chunks of `concurrency` and runs
//! each chunk through `now` with `join_all`; chunk N+1 starts only
//! after chunk N fully settles. The bound is deliberate back-pressure
//! on downstream resources, never a global pool.

use futures::future::join_all;

use conveyor_core::config::engine::EngineConfig;
use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;

use crate::definition::{JobParams, JobResultValue, JobType};
use crate::runtime::{JobOutcome, NowOptions};

/// Options for [`JobType::batch`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum jobs in flight at once. Zero is a hard error, not a
    /// silent default: it would mask a caller bug.
    pub concurrency: usize,
    /// Short-circuit on the first failure instead of collecting.
    pub stop_on_error: bool,
    /// Persist a record per job (default true).
    pub persist: bool,
    /// Correlation identifier stamped on every job in the batch.
    pub correlation_id: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: EngineConfig::default().batch_concurrency,
            stop_on_error: false,
            persist: true,
            correlation_id: None,
        }
    }
}

impl<P: JobParams, R: JobResultValue> JobType<P, R> {
    /// Execute a list of param sets under a concurrency cap.
    ///
    /// With `stop_on_error=false` (the default) failures are collected:
    /// successes come back in input order and the failure count is
    /// emitted as a WARN. Callers distinguish "some failed" from "all
    /// failed" by comparing the result length against the input length.
    /// With `stop_on_error=true` the first failure propagates and the
    /// remaining chunks never start.
    pub async fn batch(
        &self,
        params_list: Vec<P>,
        options: BatchOptions,
    ) -> AppResult<Vec<JobOutcome<R>>> {
        if options.concurrency == 0 {
            return Err(AppError::configuration(
                "batch concurrency must be a positive integer",
            ));
        }

        let total = params_list.len();
        let mut successes = Vec::with_capacity(total);
        let mut failures = 0usize;

        let mut iter = params_list.into_iter().peekable();
        while iter.peek().is_some() {
            let chunk: Vec<P> = iter.by_ref().take(options.concurrency).collect();
            let runs = chunk.into_iter().map(|params| {
                self.now(
                    params,
                    NowOptions {
                        persist: options.persist,
                        worker_timeout: None,
                        correlation_id: options.correlation_id.clone(),
                    },
                )
            });

            for result in join_all(runs).await {
                match result {
                    Ok(outcome) => successes.push(outcome),
                    Err(err) if options.stop_on_error => {
                        tracing::warn!(
                            job_name = %self.name(),
                            completed = successes.len(),
                            total,
                            "Batch aborted on first failure: {err}"
                        );
                        return Err(err);
                    }
                    Err(err) => {
                        tracing::debug!(job_name = %self.name(), "Batch job failed: {err}");
                        failures += 1;
                    }
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                job_name = %self.name(),
                failures,
                total,
                "Batch finished with failures"
            );
        }
        Ok(successes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_concurrency_follows_engine_config() {
        assert_eq!(
            BatchOptions::default().concurrency,
            EngineConfig::default().batch_concurrency
        );
    }
}
