//! Self-contained 5-field cron parsing and matching.
//!
//! Standard format: `minute hour day-of-month month day-of-week`, Sunday = 0.
//! No seconds field, no named weekdays/months, no `?`/`L`/`W`/`#` specials.
//! Matching is minute-granular — seconds are ignored.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::error::SchedulerError;

/// Upper bound on the forward minute walk in [`CronExpression::next_after`]:
/// 24 hours of one-minute steps.
const MAX_SEARCH_MINUTES: u32 = 1440;

/// A parsed cron expression.
#[derive(Debug, Clone)]
pub struct CronExpression {
    /// Minute (0-59).
    minute: CronField,
    /// Hour (0-23).
    hour: CronField,
    /// Day of month (1-31).
    day: CronField,
    /// Month (1-12).
    month: CronField,
    /// Day of week (0-6, Sunday = 0).
    weekday: CronField,
}

/// A single field in a cron expression.
#[derive(Debug, Clone)]
enum CronField {
    /// Wildcard (*) - matches all values.
    Any,
    /// Wildcard step (*/n) - matches values divisible by n.
    Step(u32),
    /// Range with step (a-b/n).
    RangeStep { start: u32, end: u32, step: u32 },
    /// Union of values (e.g. 1,3,5 or 1-3,8).
    List(Vec<u32>),
    /// Inclusive range (a-b).
    Range(u32, u32),
    /// Specific value.
    Value(u32),
}

impl CronField {
    /// Parse one field. The patterns are tried in a fixed precedence order;
    /// the first that applies wins, so `1-30/5` is range+step rather than a
    /// plain range. Values are not bounds-checked: an out-of-range number
    /// parses fine and simply never matches.
    fn parse(field: &str) -> Result<Self, String> {
        if field == "*" {
            return Ok(Self::Any);
        }

        if let Some(step_str) = field.strip_prefix("*/") {
            return Ok(Self::Step(parse_step(step_str)?));
        }

        if let Some((range_part, step_str)) = field.split_once('/') {
            let step = parse_step(step_str)?;
            if range_part == "*" {
                return Ok(Self::Step(step));
            }
            let (start, end) = parse_range(range_part)?;
            return Ok(Self::RangeStep { start, end, step });
        }

        if field.contains(',') {
            let mut values = Vec::new();
            for token in field.split(',') {
                if token.contains('-') {
                    let (start, end) = parse_range(token)?;
                    values.extend(start..=end);
                } else {
                    values.push(parse_number(token)?);
                }
            }
            return Ok(Self::List(values));
        }

        if field.contains('-') {
            let (start, end) = parse_range(field)?;
            return Ok(Self::Range(start, end));
        }

        Ok(Self::Value(parse_number(field)?))
    }

    /// Check if the field matches the given value.
    fn matches(&self, value: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Step(step) => value % step == 0,
            Self::RangeStep { start, end, step } => {
                value >= *start && value <= *end && (value - start) % step == 0
            }
            Self::List(values) => values.contains(&value),
            Self::Range(start, end) => value >= *start && value <= *end,
            Self::Value(v) => *v == value,
        }
    }
}

fn parse_number(token: &str) -> Result<u32, String> {
    token
        .parse()
        .map_err(|_| format!("'{token}' is not a number"))
}

fn parse_step(token: &str) -> Result<u32, String> {
    match token.parse() {
        Ok(0) | Err(_) => Err(format!("step '{token}' is not a positive integer")),
        Ok(step) => Ok(step),
    }
}

fn parse_range(token: &str) -> Result<(u32, u32), String> {
    let (start, end) = token
        .split_once('-')
        .ok_or_else(|| format!("'{token}' is not a range"))?;
    Ok((parse_number(start)?, parse_number(end)?))
}

impl CronExpression {
    /// Parse a cron expression string.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidCronExpression`] when the expression
    /// does not split into exactly 5 whitespace-separated fields, or when
    /// any field fails to parse.
    pub fn parse(expr: &str) -> Result<Self, SchedulerError> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(SchedulerError::invalid_cron(
                expr,
                format!("expected 5 fields, found {}", parts.len()),
            ));
        }

        let field = |raw: &str, name: &str| {
            CronField::parse(raw)
                .map_err(|reason| SchedulerError::invalid_cron(expr, format!("{name}: {reason}")))
        };

        Ok(Self {
            minute: field(parts[0], "minute")?,
            hour: field(parts[1], "hour")?,
            day: field(parts[2], "day-of-month")?,
            month: field(parts[3], "month")?,
            weekday: field(parts[4], "day-of-week")?,
        })
    }

    /// Whether `time` satisfies all five fields, at minute granularity.
    #[must_use]
    pub fn matches(&self, time: &DateTime<Utc>) -> bool {
        self.minute.matches(time.minute())
            && self.hour.matches(time.hour())
            && self.day.matches(time.day())
            && self.month.matches(time.month())
            && self.weekday.matches(time.weekday().num_days_from_sunday())
    }

    /// The first matching minute strictly after `from`, walking one minute
    /// at a time from the top of `from`'s minute, bounded at 24 hours.
    ///
    /// If no minute in the next 24 hours matches, returns `from + 24h` as a
    /// fallback rather than a true schedule match. Expressions whose only
    /// occurrences lie further out (e.g. a fixed day-of-month in an excluded
    /// month) drift by repeatedly rescheduling 24h ahead. Accepted
    /// limitation; the bound and fallback are part of the contract.
    #[must_use]
    pub fn next_after(&self, from: &DateTime<Utc>) -> DateTime<Utc> {
        let mut candidate = from
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(*from);

        for _ in 0..MAX_SEARCH_MINUTES {
            candidate += Duration::minutes(1);
            if self.matches(&candidate) {
                return candidate;
            }
        }

        *from + Duration::hours(24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        assert!(expr.matches(&Utc::now()));
    }

    #[test]
    fn test_wildcard_step_on_minute_field() {
        let expr = CronExpression::parse("*/15 * * * *").unwrap();
        for minute in 0..60 {
            let time = at(2024, 3, 10, 8, minute);
            assert_eq!(expr.matches(&time), [0, 15, 30, 45].contains(&minute));
        }
    }

    #[test]
    fn test_range_step_precedence_over_plain_range() {
        // 1-30/5 on day-of-month must parse as range+step, not plain range.
        let expr = CronExpression::parse("0 0 1-30/5 * *").unwrap();
        for day in [1, 6, 11, 16, 21, 26] {
            assert!(expr.matches(&at(2024, 3, day, 0, 0)), "day {day}");
        }
        for day in [2, 7, 31] {
            assert!(!expr.matches(&at(2024, 3, day, 0, 0)), "day {day}");
        }
    }

    #[test]
    fn test_list_with_sub_ranges() {
        let expr = CronExpression::parse("0 1-3,8 * * *").unwrap();
        for hour in [1, 2, 3, 8] {
            assert!(expr.matches(&at(2024, 3, 10, hour, 0)), "hour {hour}");
        }
        for hour in [0, 4, 7, 9] {
            assert!(!expr.matches(&at(2024, 3, 10, hour, 0)), "hour {hour}");
        }
    }

    #[test]
    fn test_weekday_range() {
        let expr = CronExpression::parse("0 9 * * 1-5").unwrap();
        // 2024-01-01 was a Monday, 2024-01-06 a Saturday.
        assert!(expr.matches(&at(2024, 1, 1, 9, 0)));
        assert!(!expr.matches(&at(2024, 1, 6, 9, 0)));
        // Same weekday, wrong minute.
        assert!(!expr.matches(&at(2024, 1, 1, 9, 1)));
    }

    #[test]
    fn test_seconds_are_ignored() {
        let expr = CronExpression::parse("30 12 * * *").unwrap();
        let time = Utc.with_ymd_and_hms(2024, 5, 2, 12, 30, 59).unwrap();
        assert!(expr.matches(&time));
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(matches!(
            CronExpression::parse("* * *"),
            Err(SchedulerError::InvalidCronExpression { .. })
        ));
        assert!(CronExpression::parse("* * * * * *").is_err());
        assert!(CronExpression::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(CronExpression::parse("abc * * * *").is_err());
        assert!(CronExpression::parse("*/0 * * * *").is_err());
        assert!(CronExpression::parse("*/x * * * *").is_err());
        assert!(CronExpression::parse("1-x * * * *").is_err());
        assert!(CronExpression::parse("1,2,y * * * *").is_err());
        assert!(CronExpression::parse("1-5/0 * * * *").is_err());
    }

    #[test]
    fn test_out_of_range_value_parses_but_never_matches() {
        let expr = CronExpression::parse("75 * * * *").unwrap();
        for minute in 0..60 {
            assert!(!expr.matches(&at(2024, 3, 10, 8, minute)));
        }
    }

    #[test]
    fn test_next_after_is_strictly_future() {
        let expr = CronExpression::parse("*/5 * * * *").unwrap();
        // Even from a second-zero instant that itself matches.
        let from = at(2024, 3, 10, 8, 15);
        let next = expr.next_after(&from);
        assert!(next > from);
        assert_eq!(next, at(2024, 3, 10, 8, 20));
    }

    #[test]
    fn test_next_after_truncates_seconds() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 10, 8, 15, 42).unwrap();
        assert_eq!(expr.next_after(&from), at(2024, 3, 10, 8, 16));
    }

    #[test]
    fn test_next_after_crosses_day_boundary() {
        let expr = CronExpression::parse("30 9 * * *").unwrap();
        let from = at(2024, 3, 10, 10, 0);
        assert_eq!(expr.next_after(&from), at(2024, 3, 11, 9, 30));
    }

    #[test]
    fn test_next_after_falls_back_after_24h() {
        // April has no 31st; nothing matches within the search bound.
        let expr = CronExpression::parse("0 0 31 4 *").unwrap();
        let from = at(2024, 4, 1, 0, 0);
        assert_eq!(expr.next_after(&from), from + Duration::hours(24));
    }
}
