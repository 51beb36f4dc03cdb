//! # conveyor-entity
//!
//! Persisted domain models for Conveyor: job records, job status, run
//! metadata, and cron schedule definitions.

pub mod cron;
pub mod job;

pub use cron::{CronJobRecord, NewCronJob};
pub use job::{JobMetadata, JobRecord, JobStatus, NewJob};
