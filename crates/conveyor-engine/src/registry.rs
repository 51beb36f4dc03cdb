//! Job registry for generic dispatch by name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;
use conveyor_entity::job::metadata::JobMetadata;

use crate::definition::{JobParams, JobResultValue, JobType};

/// Type-erased view of a bound job type, used by a generic worker to
/// dispatch a claimed record to its handler by job name.
#[async_trait]
pub trait RegisteredJob: Send + Sync + std::fmt::Debug {
    /// The job name.
    fn name(&self) -> &str;

    /// Execute a persisted record, returning only the run metadata
    /// (the typed result is erased).
    async fn run_from_database(&self, job_id: Uuid) -> AppResult<JobMetadata>;
}

#[async_trait]
impl<P: JobParams, R: JobResultValue> RegisteredJob for JobType<P, R> {
    fn name(&self) -> &str {
        JobType::name(self)
    }

    async fn run_from_database(&self, job_id: Uuid) -> AppResult<JobMetadata> {
        self.execute_from_database(job_id)
            .await
            .map(|outcome| outcome.metadata)
    }
}

/// Name → job type lookup.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Arc<dyn RegisteredJob>>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job type.
    ///
    /// Fails with a `Conflict` error when the name is already
    /// registered; the registry is left unchanged.
    pub fn register(&mut self, job: Arc<dyn RegisteredJob>) -> AppResult<()> {
        let name = job.name().to_string();
        if self.jobs.contains_key(&name) {
            return Err(AppError::conflict(format!(
                "job '{name}' is already registered"
            )));
        }

        tracing::info!(job_name = %name, "Registered job type");
        self.jobs.insert(name, job);
        Ok(())
    }

    /// Look up a job type by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RegisteredJob>> {
        self.jobs.get(name)
    }

    /// Whether a job type with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Registered job names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.keys().cloned().collect();
        names.sort();
        names
    }
}
