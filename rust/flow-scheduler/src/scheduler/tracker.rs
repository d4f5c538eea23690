//! In-flight execution tracking.

use std::collections::HashSet;

use parking_lot::Mutex;
use uuid::Uuid;

/// The set of flows with an outstanding execution.
///
/// This is the sole mechanism preventing two overlapping ticks from
/// double-triggering the same flow while its execution is still in flight.
/// Membership is ephemeral — nothing here is persisted or shared across
/// processes.
#[derive(Debug, Default)]
pub struct ExecutionTracker {
    in_flight: Mutex<HashSet<Uuid>>,
}

impl ExecutionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically mark a flow as executing. Returns `false` if it was
    /// already marked — the caller must treat that as "skip, already
    /// running".
    pub fn try_mark(&self, flow_id: Uuid) -> bool {
        self.in_flight.lock().insert(flow_id)
    }

    /// Remove a flow from the in-flight set. Idempotent; safe to call for a
    /// flow that was never marked.
    pub fn unmark(&self, flow_id: Uuid) {
        self.in_flight.lock().remove(&flow_id);
    }

    /// Whether a flow currently has an outstanding execution.
    #[must_use]
    pub fn contains(&self, flow_id: Uuid) -> bool {
        self.in_flight.lock().contains(&flow_id)
    }

    /// Snapshot of the flows currently executing.
    #[must_use]
    pub fn ids(&self) -> Vec<Uuid> {
        self.in_flight.lock().iter().copied().collect()
    }

    /// Number of flows currently executing.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Whether nothing is executing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.lock().is_empty()
    }
}
