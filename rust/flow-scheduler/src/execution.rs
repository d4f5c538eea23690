//! Execution engine boundary.
//!
//! The engine runs a flow's node graph; the scheduler only starts executions
//! and observes their settlement. No timeout is imposed here — timeout
//! policy, if any, belongs to the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::{Flow, ScheduleType};

/// Trigger source recorded on every scheduled execution.
pub const TRIGGERED_BY_SCHEDULE: &str = "schedule";

/// Metadata describing why an execution was started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerData {
    /// The firing strategy that produced this trigger.
    pub schedule_type: ScheduleType,
    /// The tick instant that found the flow due.
    pub scheduled_at: DateTime<Utc>,
}

/// A request to start one flow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// The flow to execute.
    pub flow_id: Uuid,
    /// The schedule's opaque `default_input` payload.
    pub input: serde_json::Value,
    /// Always [`TRIGGERED_BY_SCHEDULE`] for requests built here.
    pub triggered_by: String,
    /// Trigger metadata.
    pub trigger_data: TriggerData,
}

impl ExecutionRequest {
    /// Build the request for a flow found due at `scheduled_at`.
    #[must_use]
    pub fn scheduled(flow: &Flow, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            flow_id: flow.id,
            input: flow.schedule.default_input.clone(),
            triggered_by: TRIGGERED_BY_SCHEDULE.to_string(),
            trigger_data: TriggerData {
                schedule_type: flow.schedule.schedule_type,
                scheduled_at,
            },
        }
    }
}

/// The engine's answer to a started execution, reported at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Identifier of the execution the engine created.
    pub execution_id: String,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Engine-defined status string.
    pub status: String,
}

/// The external execution engine.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Start one execution and await its settlement. An `Err` means the
    /// trigger was rejected or the run failed outright; the scheduler still
    /// counts it as a completed attempt.
    async fn start_execution(&self, request: ExecutionRequest) -> anyhow::Result<ExecutionResult>;
}
