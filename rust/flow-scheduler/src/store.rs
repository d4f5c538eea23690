//! Flow store boundary.
//!
//! The store owns the flow and schedule records; the engine only reads
//! snapshots and writes full-record schedule overwrites (last-writer-wins,
//! single scheduler instance assumed).

use async_trait::async_trait;
use uuid::Uuid;

use crate::flow::{Flow, Schedule};

/// The external flow-definition store.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Fetch flows with some notion of "active". The engine applies its own
    /// enabled/date-window/max-runs filtering on top of whatever the store
    /// returns.
    async fn get_active_flows(&self) -> anyhow::Result<Vec<Flow>>;

    /// Overwrite a flow's schedule record in full.
    async fn update_flow_schedule(&self, flow_id: Uuid, schedule: Schedule) -> anyhow::Result<()>;
}
