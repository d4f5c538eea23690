//! Flow and schedule records.
//!
//! [`Schedule`] is the declarative firing policy attached to a flow: one of
//! one-shot, fixed interval, or 5-field cron, plus the bookkeeping the engine
//! re-arms after every completed execution attempt. The record is owned by
//! the external store; the engine treats every read as a possibly-stale
//! snapshot and every write as a full-record overwrite.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which due-ness/next-run strategy applies. Immutable for the life of a
/// schedule instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// Fires at most once, driven entirely by a pre-existing `next_run_at`.
    Once,
    /// Fires every `interval_value` × `interval_unit`.
    Interval,
    /// Fires on minutes matching a 5-field cron expression.
    Cron,
}

impl ScheduleType {
    /// Stable string form, matching the wire format.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Interval => "interval",
            Self::Cron => "cron",
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of an interval schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    /// 60 000 ms.
    Minutes,
    /// 3 600 000 ms.
    #[default]
    Hours,
    /// 86 400 000 ms.
    Days,
    /// 604 800 000 ms.
    Weeks,
    /// Any unit the store hands us that we do not know. Treated as hours —
    /// a permissive default, not an error.
    #[serde(other)]
    Other,
}

impl IntervalUnit {
    /// Milliseconds per unit.
    #[must_use]
    pub fn unit_millis(&self) -> i64 {
        match self {
            Self::Minutes => 60_000,
            Self::Hours | Self::Other => 3_600_000,
            Self::Days => 86_400_000,
            Self::Weeks => 604_800_000,
        }
    }

    /// The span covered by `value` of this unit.
    #[must_use]
    pub fn span(&self, value: u32) -> Duration {
        Duration::milliseconds(i64::from(value) * self.unit_millis())
    }
}

/// The declarative firing policy attached to a flow. One schedule per flow.
///
/// Field names follow the store's camelCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Strategy selector.
    pub schedule_type: ScheduleType,
    /// Gate; disabled schedules are never evaluated.
    #[serde(default)]
    pub is_enabled: bool,
    /// Schedule is inactive before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Schedule is inactive after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Force-disable once `run_count` reaches this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u32>,
    /// Completed execution attempts, success or failure.
    #[serde(default)]
    pub run_count: u32,
    /// When the last execution attempt completed (not when it started).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// Authoritative "when to fire next"; recomputed after every completed
    /// run. Absent means due-ness falls back to per-type behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    /// Interval multiplier; only meaningful for interval schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_value: Option<u32>,
    /// Interval unit; only meaningful for interval schedules.
    #[serde(default)]
    pub interval_unit: IntervalUnit,
    /// 5-field cron expression; only meaningful for cron schedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    /// Opaque payload forwarded to the execution engine on trigger.
    #[serde(default)]
    pub default_input: serde_json::Value,
}

impl Schedule {
    /// An enabled one-shot schedule. Fires only via a stored `next_run_at`.
    #[must_use]
    pub fn once() -> Self {
        Self::with_type(ScheduleType::Once)
    }

    /// An enabled interval schedule.
    #[must_use]
    pub fn interval(value: u32, unit: IntervalUnit) -> Self {
        Self {
            interval_value: Some(value),
            interval_unit: unit,
            ..Self::with_type(ScheduleType::Interval)
        }
    }

    /// An enabled cron schedule.
    #[must_use]
    pub fn cron(expression: impl Into<String>) -> Self {
        Self {
            cron_expression: Some(expression.into()),
            ..Self::with_type(ScheduleType::Cron)
        }
    }

    fn with_type(schedule_type: ScheduleType) -> Self {
        Self {
            schedule_type,
            is_enabled: true,
            start_date: None,
            end_date: None,
            max_runs: None,
            run_count: 0,
            last_run_at: None,
            next_run_at: None,
            interval_value: None,
            interval_unit: IntervalUnit::default(),
            cron_expression: None,
            default_input: serde_json::Value::Null,
        }
    }

    /// Whether `now` falls within `[start_date, end_date]`, treating a
    /// missing bound as unconstrained.
    #[must_use]
    pub fn within_date_window(&self, now: DateTime<Utc>) -> bool {
        if self.start_date.is_some_and(|start| now < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| now > end) {
            return false;
        }
        true
    }

    /// Whether the run-count window is still open, treating a missing
    /// `max_runs` as unconstrained.
    #[must_use]
    pub fn has_runs_remaining(&self) -> bool {
        self.max_runs.is_none_or(|max| self.run_count < max)
    }

    /// Apply the post-execution bookkeeping for a completed attempt
    /// (success or failure): count the run, stamp `last_run_at`, install the
    /// recomputed `next_run_at`, and apply the terminal-disablement rules.
    ///
    /// A one-shot schedule never fires twice, and `run_count` never exceeds
    /// an enforced `max_runs` — both are disabled here, before any overshoot
    /// could happen.
    pub fn rearm(&mut self, next_run: Option<DateTime<Utc>>, completed_at: DateTime<Utc>) {
        self.next_run_at = next_run;
        self.last_run_at = Some(completed_at);
        self.run_count = self.run_count.saturating_add(1);

        if self.schedule_type == ScheduleType::Once {
            self.is_enabled = false;
        } else if self.max_runs.is_some_and(|max| self.run_count >= max) {
            self.is_enabled = false;
        }
    }
}

/// A user-defined automation flow, as seen at the scheduling boundary. The
/// flow's node graph is the execution engine's concern, not ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Flow identifier.
    pub id: Uuid,
    /// Human-readable name, carried into lifecycle events.
    pub name: String,
    /// Whether the flow itself is active, independent of its schedule.
    #[serde(default)]
    pub is_active: bool,
    /// The flow's firing policy.
    pub schedule: Schedule,
}

impl Flow {
    /// Whether this flow belongs in the candidate set for a tick at `now`:
    /// schedule enabled, flow active, inside the date window, and run-count
    /// window still open. Max-runs-exhausted flows are excluded here, before
    /// due-ness is ever evaluated.
    #[must_use]
    pub fn is_candidate_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.schedule.is_enabled
            && self.schedule.within_date_window(now)
            && self.schedule.has_runs_remaining()
    }
}
