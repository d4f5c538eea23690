//! Tolerance-window due-ness evaluation.

use chrono::{DateTime, Duration, Utc};

use crate::error::SchedulerError;
use crate::flow::{Schedule, ScheduleType};

use super::cron::CronExpression;

/// Decide whether `schedule` should fire during the tick at `tick_time`.
///
/// With a stored `next_run_at` the window is asymmetric: a schedule may fire
/// up to `tolerance` early and up to one `tick_period` late. A due time
/// missed by more than one tick is not retroactively fired — it counts as a
/// missed occurrence, and the next re-arm recomputes `next_run_at` for
/// interval/cron types. A sufficiently delayed one-shot is effectively
/// skipped (accepted edge case, not auto-rescheduled).
///
/// Without a stored `next_run_at`, the per-type fallback applies:
/// - `once`: never due — there is nothing to derive a fire time from.
/// - `interval`: due on the very first evaluation (`last_run_at` unset),
///   else once `interval − tolerance` has elapsed since the last run.
/// - `cron`: due when the expression matches the current tick's minute.
///
/// # Errors
///
/// [`SchedulerError::InvalidCronExpression`] for a cron fallback check with
/// a missing or malformed expression. The caller treats this as "not due"
/// for the current tick and logs it at flow granularity.
pub fn is_due(
    schedule: &Schedule,
    tick_time: DateTime<Utc>,
    tick_period: std::time::Duration,
    tolerance: std::time::Duration,
) -> Result<bool, SchedulerError> {
    let tolerance = Duration::from_std(tolerance).unwrap_or_else(|_| Duration::seconds(30));
    let tick_period = Duration::from_std(tick_period).unwrap_or_else(|_| Duration::seconds(60));

    if let Some(next_run_at) = schedule.next_run_at {
        let delta = tick_time - next_run_at;
        return Ok(delta >= -tolerance && delta <= tick_period);
    }

    match schedule.schedule_type {
        ScheduleType::Once => Ok(false),
        ScheduleType::Interval => match schedule.last_run_at {
            // First run fires immediately, regardless of interval length.
            None => Ok(true),
            Some(last_run_at) => Ok(schedule.interval_value.is_some_and(|value| {
                tick_time - last_run_at >= schedule.interval_unit.span(value) - tolerance
            })),
        },
        ScheduleType::Cron => {
            let expression = schedule
                .cron_expression
                .as_deref()
                .ok_or_else(|| SchedulerError::invalid_cron("", "missing cron expression"))?;
            let parsed = CronExpression::parse(expression)?;
            Ok(parsed.matches(&tick_time))
        }
    }
}
