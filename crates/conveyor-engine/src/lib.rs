//! # conveyor-engine
//!
//! The job runtime: typed job definitions, the registry a generic
//! worker dispatches through, the execution context handlers receive,
//! and the state machine behind `now` / `later` / `batch` /
//! `execute_from_database`, plus the expired-lock reclaim sweep.

pub mod batch;
pub mod context;
pub mod definition;
pub mod reclaim;
pub mod registry;
pub mod runtime;

pub use batch::BatchOptions;
pub use context::JobContext;
pub use definition::{JobDefinition, JobParams, JobResultValue, JobType};
pub use reclaim::{reclaim_expired, ReclaimReport};
pub use registry::{JobRegistry, RegisteredJob};
pub use runtime::{JobOutcome, LaterOptions, NowOptions};
