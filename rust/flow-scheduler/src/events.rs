//! Scheduler lifecycle event model.
//!
//! Events are published on a broadcast channel; anyone holding a scheduler
//! handle can [`subscribe`](crate::FlowScheduler::subscribe). Publishing with
//! zero subscribers is fine — the scheduler never depends on being observed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::flow::ScheduleType;

/// A scheduler lifecycle notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// The scheduler loop started.
    Started,

    /// The scheduler loop stopped. In-flight executions still settle and
    /// re-arm after this.
    Stopped,

    /// A due flow is about to be handed to the execution engine.
    FlowExecuting {
        /// Flow being triggered.
        flow_id: Uuid,
        /// Flow name.
        flow_name: String,
        /// The firing strategy that made it due.
        schedule_type: ScheduleType,
    },

    /// The execution engine accepted the trigger and settled.
    FlowExecuted {
        /// Flow that ran.
        flow_id: Uuid,
        /// Execution identifier assigned by the engine.
        execution_id: String,
        /// Whether the execution succeeded.
        success: bool,
    },

    /// The trigger was rejected or the run failed outright.
    FlowFailed {
        /// Flow whose trigger failed.
        flow_id: Uuid,
        /// Error message.
        error: String,
    },
}

impl SchedulerEvent {
    /// Stable event-type string for log sinks and outbound channels.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started => "scheduler.started",
            Self::Stopped => "scheduler.stopped",
            Self::FlowExecuting { .. } => "flow.executing",
            Self::FlowExecuted { .. } => "flow.executed",
            Self::FlowFailed { .. } => "flow.failed",
        }
    }
}

/// Broadcast-backed fan-out for [`SchedulerEvent`]s.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<SchedulerEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. A send error only means nobody is listening.
    pub(crate) fn emit(&self, event: SchedulerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_strings() {
        assert_eq!(SchedulerEvent::Started.event_type(), "scheduler.started");
        assert_eq!(SchedulerEvent::Stopped.event_type(), "scheduler.stopped");

        let executing = SchedulerEvent::FlowExecuting {
            flow_id: Uuid::new_v4(),
            flow_name: "nightly sync".to_string(),
            schedule_type: ScheduleType::Cron,
        };
        assert_eq!(executing.event_type(), "flow.executing");
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = SchedulerEvent::FlowFailed {
            flow_id: Uuid::new_v4(),
            error: "engine unavailable".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "flow_failed");
        assert_eq!(value["error"], "engine unavailable");
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.emit(SchedulerEvent::Started);

        let mut rx = bus.subscribe();
        bus.emit(SchedulerEvent::Stopped);
        assert!(matches!(rx.try_recv(), Ok(SchedulerEvent::Stopped)));
    }
}
