//! PostgreSQL store implementations.

pub mod cron;
pub mod job;

pub use cron::PgCronStore;
pub use job::PgJobStore;
