//! Cron schedule domain entities.

pub mod model;
pub mod schedule;

pub use model::{CronJobRecord, NewCronJob};
pub use schedule::{next_fire_after, parse_expression};
