//! Error taxonomy for the schedule engine.
//!
//! Every variant is scoped: cron and trigger failures stay within one flow's
//! processing for one tick, and only a whole-tick store fetch failure aborts
//! a tick. Nothing here ever crashes the scheduler task.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the schedule engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression did not split into 5 fields, or a field failed
    /// to parse. Scoped to a single flow's due-ness check for one tick.
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression {
        /// The offending expression.
        expression: String,
        /// What failed to parse.
        reason: String,
    },

    /// The execution engine rejected or failed the trigger. The flow is
    /// still re-armed as a completed-but-failed attempt.
    #[error("failed to trigger execution for flow {flow_id}")]
    ExecutionTrigger {
        /// The flow whose trigger failed.
        flow_id: Uuid,
        /// Underlying engine error.
        #[source]
        source: anyhow::Error,
    },

    /// The flow store rejected a fetch or update. A fetch failure ends the
    /// tick early; an update failure leaves the record stale until the next
    /// tick re-derives the same decision.
    #[error("flow store operation '{operation}' failed")]
    StoreAccess {
        /// The store operation that failed.
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: anyhow::Error,
    },
}

impl SchedulerError {
    /// Construct an [`SchedulerError::InvalidCronExpression`].
    pub(crate) fn invalid_cron(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCronExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}
