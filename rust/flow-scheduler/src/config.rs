//! Scheduler configuration.

use std::time::Duration;

/// Tuning knobs for the [`FlowScheduler`](crate::FlowScheduler).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the evaluation pass runs.
    pub tick_period: Duration,
    /// Grace window around a stored `next_run_at`: a schedule may fire up to
    /// this much early, and up to one tick period late.
    pub tolerance: Duration,
    /// Capacity of the lifecycle event channel.
    pub event_capacity: usize,
    /// Maximum number of completed trigger attempts kept in memory.
    pub run_history_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(60),
            tolerance: Duration::from_secs(30),
            event_capacity: 64,
            run_history_limit: 256,
        }
    }
}
