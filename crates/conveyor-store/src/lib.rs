//! # conveyor-store
//!
//! Durable job store contracts and implementations: the [`JobStore`] and
//! [`CronStore`] traits, their PostgreSQL implementations on sqlx, an
//! in-memory implementation for embedding and tests, and connection
//! pool / migration management.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryCronStore, MemoryJobStore};
pub use postgres::{PgCronStore, PgJobStore};
pub use store::{CronStore, JobStore, ReclaimOutcome, LOCK_EXPIRED_ERROR};
