//! Schedule evaluation and execution coordination.
//!
//! The pieces, leaves first: [`cron`] matches a point in time against a
//! 5-field expression; [`next_run`](next_run::next_run) computes when a
//! schedule should fire next; [`is_due`](dueness::is_due) decides whether a
//! schedule fires on the current tick; [`ExecutionTracker`] prevents
//! overlapping triggers per flow; [`FlowScheduler`] drives all of it on a
//! periodic tick.

pub mod cron;
pub mod dueness;
pub mod next_run;
pub mod service;
pub mod tracker;

pub use cron::CronExpression;
pub use dueness::is_due;
pub use next_run::next_run;
pub use service::{FlowRunRecord, FlowScheduler};
pub use tracker::ExecutionTracker;
