//! Five-field cron expression parsing and next-fire computation.
//!
//! Schedules use the standard five-field form
//! (`minute hour day-of-month month day-of-week`). The underlying
//! parser works on six fields with a leading seconds column, so a
//! seconds column of `0` is prepended before parsing: every fire lands
//! on second zero.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

use conveyor_core::error::AppError;
use conveyor_core::result::AppResult;

/// Parse a five-field cron expression.
///
/// Fails with a `Validation` error when the expression is empty, has
/// the wrong number of fields, or does not parse.
pub fn parse_expression(expression: &str) -> AppResult<Schedule> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("cron expression must not be empty"));
    }

    let fields = trimmed.split_whitespace().count();
    if fields != 5 {
        return Err(AppError::validation(format!(
            "cron expression must have 5 fields (minute hour day month weekday), got {fields}: '{trimmed}'"
        )));
    }

    Schedule::from_str(&format!("0 {trimmed}")).map_err(|e| {
        AppError::with_source(
            conveyor_core::ErrorKind::Validation,
            format!("invalid cron expression '{trimmed}': {e}"),
            e,
        )
    })
}

/// Compute the next fire time strictly after `after`.
///
/// Returns `None` for schedules with no future occurrence.
pub fn next_fire_after(expression: &str, after: DateTime<Utc>) -> AppResult<Option<DateTime<Utc>>> {
    let schedule = parse_expression(expression)?;
    Ok(schedule.after(&after).next())
}
