//! Next-run-time calculation per schedule type.

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::flow::{Schedule, ScheduleType};

use super::cron::CronExpression;

/// Compute the next time `schedule` should fire, from `from`.
///
/// - `once`: always `None` — one-shot schedules have no "next" by
///   definition; their due-ness is driven entirely by a pre-existing
///   `next_run_at`.
/// - `interval`: `from + interval_value × unit`. A missing `interval_value`
///   leaves the schedule inert (`None`) rather than erroring.
/// - `cron`: the bounded forward walk of
///   [`CronExpression::next_after`], including its 24h fallback.
///
/// # Errors
///
/// [`SchedulerError::InvalidCronExpression`] for a cron schedule whose
/// expression is missing or malformed.
pub fn next_run(
    schedule: &Schedule,
    from: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    match schedule.schedule_type {
        ScheduleType::Once => Ok(None),
        ScheduleType::Interval => Ok(schedule
            .interval_value
            .map(|value| from + schedule.interval_unit.span(value))),
        ScheduleType::Cron => {
            let expression = schedule
                .cron_expression
                .as_deref()
                .ok_or_else(|| SchedulerError::invalid_cron("", "missing cron expression"))?;
            let parsed = CronExpression::parse(expression)?;
            Ok(Some(parsed.next_after(&from)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::IntervalUnit;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_once_has_no_next_run() {
        let now = Utc::now();
        let mut schedule = Schedule::once();
        schedule.next_run_at = Some(now);
        assert_eq!(next_run(&schedule, now).unwrap(), None);
    }

    #[test]
    fn test_interval_advances_by_unit_table() {
        let now = Utc::now();
        let cases = [
            (IntervalUnit::Minutes, Duration::minutes(30), 30),
            (IntervalUnit::Hours, Duration::hours(2), 2),
            (IntervalUnit::Days, Duration::days(1), 1),
            (IntervalUnit::Weeks, Duration::weeks(2), 2),
            // Unknown unit falls back to hours.
            (IntervalUnit::Other, Duration::hours(3), 3),
        ];
        for (unit, expected, value) in cases {
            let schedule = Schedule::interval(value, unit);
            assert_eq!(
                next_run(&schedule, now).unwrap(),
                Some(now + expected),
                "{unit:?}"
            );
        }
    }

    #[test]
    fn test_interval_without_value_is_inert() {
        let now = Utc::now();
        let mut schedule = Schedule::interval(1, IntervalUnit::Hours);
        schedule.interval_value = None;
        assert_eq!(next_run(&schedule, now).unwrap(), None);
    }

    #[test]
    fn test_cron_next_run_is_strictly_future() {
        let from = Utc.with_ymd_and_hms(2024, 6, 3, 11, 59, 20).unwrap();
        let schedule = Schedule::cron("0 12 * * *");
        let next = next_run(&schedule, from).unwrap().unwrap();
        assert!(next > from);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_cron_missing_expression_errors() {
        let now = Utc::now();
        let mut schedule = Schedule::cron("* * * * *");
        schedule.cron_expression = None;
        assert!(matches!(
            next_run(&schedule, now),
            Err(SchedulerError::InvalidCronExpression { .. })
        ));
    }

    #[test]
    fn test_cron_malformed_expression_errors() {
        let now = Utc::now();
        let schedule = Schedule::cron("* * *");
        assert!(next_run(&schedule, now).is_err());
    }
}
