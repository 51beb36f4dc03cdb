//! Typed job definitions.
//!
//! A [`JobDefinition`] is an explicit value carrying the job name,
//! retry/lock defaults, and the handler behind an `Arc`. There is no
//! shared static state between job types. Binding a definition to a
//! store produces a [`JobType`], the dispatchable handle whose methods
//! are `now`, `later`, `batch`, and `execute_from_database`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use conveyor_core::config::engine::EngineConfig;
use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;
use conveyor_store::JobStore;

use crate::context::JobContext;

/// Bound for job param types. The type itself is the params schema:
/// serde gives the wire shape, `Validate` supplies field-level rules.
pub trait JobParams: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {}
impl<T> JobParams for T where T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {}

/// Bound for job result types, mirroring [`JobParams`].
pub trait JobResultValue: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {}
impl<T> JobResultValue for T where T: Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{}

/// Type-erased async handler stored by a definition.
pub type HandlerFn<P, R> =
    dyn Fn(P, JobContext) -> BoxFuture<'static, AppResult<R>> + Send + Sync;

/// An immutable, reusable job definition.
pub struct JobDefinition<P, R> {
    name: String,
    max_attempts: i32,
    worker_timeout: Duration,
    handler: Arc<HandlerFn<P, R>>,
}

impl<P: JobParams, R: JobResultValue> JobDefinition<P, R> {
    /// Create a definition from a name and an async handler.
    ///
    /// Fails with a `Configuration` error when the name is empty or
    /// blank. Attempt and lock defaults come from
    /// [`EngineConfig::default`] (3 execution attempts, 5 minute
    /// worker lock).
    pub fn new<H, Fut>(name: impl Into<String>, handler: H) -> AppResult<Self>
    where
        H: Fn(P, JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<R>> + Send + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::configuration("job name must not be empty"));
        }

        let handler: Arc<HandlerFn<P, R>> = Arc::new(move |params, ctx| {
            Box::pin(handler(params, ctx)) as BoxFuture<'static, AppResult<R>>
        });

        let defaults = EngineConfig::default();
        Ok(Self {
            name,
            max_attempts: defaults.max_attempts,
            worker_timeout: defaults.worker_timeout(),
            handler,
        })
    }

    /// Override the maximum execution attempts (must be ≥ 1).
    pub fn with_max_attempts(mut self, max_attempts: i32) -> AppResult<Self> {
        if max_attempts < 1 {
            return Err(AppError::configuration(format!(
                "max_attempts must be at least 1, got {max_attempts}"
            )));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    /// Override the worker-lock duration (must be non-zero).
    pub fn with_worker_timeout(mut self, worker_timeout: Duration) -> AppResult<Self> {
        if worker_timeout.is_zero() {
            return Err(AppError::configuration("worker_timeout must be non-zero"));
        }
        self.worker_timeout = worker_timeout;
        Ok(self)
    }

    /// The job name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default maximum execution attempts.
    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    /// Default worker-lock duration.
    pub fn worker_timeout(&self) -> Duration {
        self.worker_timeout
    }

    /// Attach a store collaborator, producing the dispatchable handle.
    pub fn bind(self, store: Arc<dyn JobStore>) -> JobType<P, R> {
        JobType {
            definition: Arc::new(self),
            store,
        }
    }
}

impl<P, R> fmt::Debug for JobDefinition<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("worker_timeout", &self.worker_timeout)
            .finish_non_exhaustive()
    }
}

/// A job definition bound to a store.
pub struct JobType<P, R> {
    pub(crate) definition: Arc<JobDefinition<P, R>>,
    pub(crate) store: Arc<dyn JobStore>,
}

impl<P, R> JobType<P, R> {
    /// The job name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The bound store handle.
    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub(crate) fn handler(&self) -> &Arc<HandlerFn<P, R>> {
        &self.definition.handler
    }
}

impl<P, R> Clone for JobType<P, R> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            store: Arc::clone(&self.store),
        }
    }
}

impl<P, R> fmt::Debug for JobType<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobType")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}
