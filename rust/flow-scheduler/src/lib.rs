//! Schedule evaluation and execution-coordination engine for automation
//! flows.
//!
//! Periodically decides, for a set of user-defined flows, whether "now" is
//! the right time to trigger an execution, based on a declarative schedule:
//! one-shot, fixed interval, or 5-field cron expression.
//!
//! # Architecture
//!
//! - [`scheduler::cron`] — self-contained cron field matcher.
//! - [`scheduler::next_run`] — next-run-time calculation per schedule type.
//! - [`scheduler::dueness`] — tolerance-window due-ness evaluation.
//! - [`scheduler::tracker`] — at-most-one-concurrent-execution guard per
//!   flow.
//! - [`scheduler::service`] — the periodic loop tying it together.
//!
//! The flow store and the execution engine are injected behind the
//! [`FlowStore`] and [`ExecutionEngine`] traits; lifecycle notifications go
//! out on a broadcast channel. Single-process, single-timer design: no
//! sub-minute precision, no cross-instance coordination, no persistence of
//! the in-flight set.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flow_scheduler::{FlowScheduler, SchedulerConfig};
//!
//! let scheduler = FlowScheduler::new(store, engine, SchedulerConfig::default());
//! let mut events = scheduler.subscribe();
//! scheduler.start();
//! // ...
//! scheduler.stop();
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod flow;
pub mod scheduler;
pub mod store;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::SchedulerEvent;
pub use execution::{ExecutionEngine, ExecutionRequest, ExecutionResult, TriggerData};
pub use flow::{Flow, IntervalUnit, Schedule, ScheduleType};
pub use scheduler::{CronExpression, ExecutionTracker, FlowRunRecord, FlowScheduler};
pub use store::FlowStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::SchedulerConfig;
    pub use crate::error::SchedulerError;
    pub use crate::events::SchedulerEvent;
    pub use crate::execution::{ExecutionEngine, ExecutionRequest, ExecutionResult};
    pub use crate::flow::{Flow, IntervalUnit, Schedule, ScheduleType};
    pub use crate::scheduler::FlowScheduler;
    pub use crate::store::FlowStore;
}
