//! # Conveyor
//!
//! An embeddable persistent background job engine: typed job
//! definitions, immediate or queued execution, durable lifecycle
//! tracking, time-boxed worker locks with expiry reclaim, bounded batch
//! concurrency, and cron schedule bookkeeping.
//!
//! The host application owns the timers (worker polling, reclaim
//! sweeps, cron fires); Conveyor supplies the job API and the atomic
//! store operations that make concurrent workers safe.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use conveyor::{AppResult, JobDefinition, MemoryJobStore, NowOptions};
//! use serde::{Deserialize, Serialize};
//! use validator::Validate;
//!
//! #[derive(Serialize, Deserialize, Validate)]
//! struct Params {
//!     #[validate(range(min = 1))]
//!     n: i64,
//! }
//!
//! #[derive(Serialize, Deserialize, Validate)]
//! struct Output {
//!     n: i64,
//! }
//!
//! # async fn demo() -> AppResult<()> {
//! let store = Arc::new(MemoryJobStore::new());
//! let double = JobDefinition::new("double", |params: Params, _ctx| async move {
//!     Ok(Output { n: params.n * 2 })
//! })?
//! .bind(store);
//!
//! let outcome = double.now(Params { n: 5 }, NowOptions::default()).await?;
//! assert_eq!(outcome.data.n, 10);
//! # Ok(())
//! # }
//! ```

pub use conveyor_core::config::{AppConfig, DatabaseConfig, logging};
pub use conveyor_core::config::engine::EngineConfig;
pub use conveyor_core::{AppError, AppResult, ErrorKind};

pub use conveyor_entity::cron::schedule::{next_fire_after, parse_expression};
pub use conveyor_entity::{CronJobRecord, JobMetadata, JobRecord, JobStatus, NewCronJob, NewJob};

pub use conveyor_store::{
    CronStore, DatabasePool, JobStore, LOCK_EXPIRED_ERROR, MemoryCronStore, MemoryJobStore,
    PgCronStore, PgJobStore, ReclaimOutcome,
};
pub use conveyor_store::migration::run_migrations;

pub use conveyor_engine::{
    BatchOptions, JobContext, JobDefinition, JobOutcome, JobParams, JobRegistry, JobResultValue,
    JobType, LaterOptions, NowOptions, ReclaimReport, RegisteredJob, reclaim_expired,
};
