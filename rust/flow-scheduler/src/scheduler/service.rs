//! The scheduler loop.
//!
//! [`FlowScheduler`] drives everything: on a fixed tick period it fetches
//! candidate flows from the store, evaluates due-ness per flow, and for
//! due-and-not-in-flight flows triggers the execution engine, then re-arms
//! the schedule through the store. Collaborators are injected — there is no
//! ambient singleton, and "now" always comes from the injected [`Clock`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::{EventBus, SchedulerEvent};
use crate::execution::{ExecutionEngine, ExecutionRequest};
use crate::flow::Flow;
use crate::store::FlowStore;

use super::dueness::is_due;
use super::next_run::next_run;
use super::tracker::ExecutionTracker;

/// One completed trigger attempt, kept in a bounded in-memory history.
/// Never persisted; derived state only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRunRecord {
    /// Flow that was triggered.
    pub flow_id: Uuid,
    /// Flow name at trigger time.
    pub flow_name: String,
    /// Execution ID the engine assigned, if the trigger was accepted.
    pub execution_id: Option<String>,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error message for a failed trigger.
    pub error: Option<String>,
    /// The tick instant that found the flow due.
    pub scheduled_at: DateTime<Utc>,
    /// When the attempt settled.
    pub completed_at: DateTime<Utc>,
}

/// The schedule evaluation and execution-coordination engine.
///
/// Cheap to clone; all clones share one scheduler.
#[derive(Clone)]
pub struct FlowScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn FlowStore>,
    engine: Arc<dyn ExecutionEngine>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    tracker: ExecutionTracker,
    events: EventBus,
    running: AtomicBool,
    /// Incremented by every `start()`; a tick task whose generation is
    /// superseded exits even if the scheduler was restarted in between.
    generation: AtomicU64,
    shutdown: Notify,
    last_check: RwLock<Option<DateTime<Utc>>>,
    scheduled: RwLock<Vec<Uuid>>,
    history: Mutex<VecDeque<FlowRunRecord>>,
}

impl FlowScheduler {
    /// Create a scheduler on the wall clock.
    #[must_use]
    pub fn new(
        store: Arc<dyn FlowStore>,
        engine: Arc<dyn ExecutionEngine>,
        config: SchedulerConfig,
    ) -> Self {
        Self::with_clock(store, engine, config, Arc::new(SystemClock))
    }

    /// Create a scheduler with an injected clock (tests, replay).
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn FlowStore>,
        engine: Arc<dyn ExecutionEngine>,
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                store,
                engine,
                clock,
                config,
                tracker: ExecutionTracker::new(),
                events,
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                shutdown: Notify::new(),
                last_check: RwLock::new(None),
                scheduled: RwLock::new(Vec::new()),
                history: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Start the periodic evaluation loop. Must be called within a tokio
    /// runtime. A no-op with a warning if already running.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler already running; start ignored");
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            tick_period_secs = self.inner.config.tick_period.as_secs(),
            "flow scheduler started"
        );
        self.inner.events.emit(SchedulerEvent::Started);

        // Built here, not in the task, so the cadence anchors at the moment
        // start() is called.
        let period = self.inner.config.tick_period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if inner.is_stale(generation) {
                            break;
                        }
                        inner.run_tick().await;
                    }
                    () = inner.shutdown.notified() => {
                        // A stale permit from an earlier stop/start cycle
                        // only wakes the select; staleness decides the exit.
                        if inner.is_stale(generation) {
                            break;
                        }
                    }
                }
            }
            debug!(generation, "scheduler tick task exited");
        });
    }

    /// Halt future ticks. A no-op with a warning if already stopped.
    ///
    /// Executions already in flight are not cancelled; they run to
    /// settlement and their re-arming still occurs.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            warn!("scheduler not running; stop ignored");
            return;
        }
        self.inner.shutdown.notify_one();
        self.inner.events.emit(SchedulerEvent::Stopped);
        info!("flow scheduler stopped");
    }

    /// Whether the periodic loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Run one evaluation pass immediately, bypassing the timer. Works
    /// whether or not the loop is running; used for tests and manual
    /// triggers.
    pub async fn force_check(&self) {
        self.inner.run_tick().await;
    }

    /// When the most recent evaluation pass started.
    #[must_use]
    pub fn last_check_time(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_check.read()
    }

    /// Flow IDs that survived the candidate filter on the most recent pass.
    #[must_use]
    pub fn scheduled_flow_ids(&self) -> Vec<Uuid> {
        self.inner.scheduled.read().clone()
    }

    /// Flow IDs with an outstanding execution right now.
    #[must_use]
    pub fn executing_flow_ids(&self) -> Vec<Uuid> {
        self.inner.tracker.ids()
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.events.subscribe()
    }

    /// The most recent completed trigger attempts, newest first.
    #[must_use]
    pub fn recent_runs(&self, limit: usize) -> Vec<FlowRunRecord> {
        let history = self.inner.history.lock();
        history.iter().rev().take(limit).cloned().collect()
    }
}

impl fmt::Debug for FlowScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowScheduler")
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .field("in_flight", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Whether the tick task spawned for `generation` should exit: the
    /// scheduler stopped, or a later `start()` superseded it.
    fn is_stale(&self, generation: u64) -> bool {
        !self.running.load(Ordering::SeqCst)
            || self.generation.load(Ordering::SeqCst) != generation
    }

    /// One evaluation pass: fetch, filter, evaluate, trigger, re-arm.
    ///
    /// A store fetch failure ends the pass early (the next tick retries from
    /// scratch). Everything past the fetch is isolated per flow: one flow's
    /// failure never prevents processing of its siblings.
    async fn run_tick(&self) {
        let now = self.clock.now();
        *self.last_check.write() = Some(now);

        let flows = match self.store.get_active_flows().await {
            Ok(flows) => flows,
            Err(source) => {
                let err = SchedulerError::StoreAccess {
                    operation: "get_active_flows",
                    source,
                };
                warn!(error = %err, "tick aborted: failed to fetch flows");
                return;
            }
        };

        let candidates: Vec<Flow> = flows
            .into_iter()
            .filter(|flow| flow.is_candidate_at(now))
            .collect();
        *self.scheduled.write() = candidates.iter().map(|flow| flow.id).collect();
        debug!(candidates = candidates.len(), "evaluating tick");

        let mut due = Vec::new();
        for flow in candidates {
            if self.tracker.contains(flow.id) {
                debug!(flow_id = %flow.id, "skipping: execution still in flight");
                continue;
            }
            match is_due(&flow.schedule, now, self.config.tick_period, self.config.tolerance) {
                Ok(true) => due.push(flow),
                Ok(false) => {}
                Err(e) => {
                    // A malformed cron expression disables this one flow's
                    // firing for this tick, nothing more.
                    warn!(flow_id = %flow.id, flow_name = %flow.name, error = %e,
                        "due-ness check failed; treating as not due");
                }
            }
        }

        // Flows are processed concurrently; order within one flow's
        // processing stays strictly sequential.
        join_all(due.into_iter().map(|flow| self.process_flow(flow, now))).await;
    }

    /// Trigger one due flow and re-arm its schedule on settlement.
    ///
    /// Per-flow order: mark → trigger → re-arm → unmark. The unmark is
    /// unconditional; a failed trigger or a failed persist never leaves the
    /// flow stuck in the in-flight set.
    async fn process_flow(&self, flow: Flow, scheduled_at: DateTime<Utc>) {
        if !self.tracker.try_mark(flow.id) {
            return;
        }

        info!(flow_id = %flow.id, flow_name = %flow.name,
            schedule_type = %flow.schedule.schedule_type, "triggering scheduled execution");
        self.events.emit(SchedulerEvent::FlowExecuting {
            flow_id: flow.id,
            flow_name: flow.name.clone(),
            schedule_type: flow.schedule.schedule_type,
        });

        let request = ExecutionRequest::scheduled(&flow, scheduled_at);
        let (execution_id, success, error) = match self.engine.start_execution(request).await {
            Ok(result) => {
                debug!(flow_id = %flow.id, execution_id = %result.execution_id,
                    success = result.success, status = %result.status, "execution settled");
                self.events.emit(SchedulerEvent::FlowExecuted {
                    flow_id: flow.id,
                    execution_id: result.execution_id.clone(),
                    success: result.success,
                });
                (Some(result.execution_id), result.success, None)
            }
            Err(source) => {
                let err = SchedulerError::ExecutionTrigger {
                    flow_id: flow.id,
                    source,
                };
                warn!(flow_id = %flow.id, flow_name = %flow.name, error = %err,
                    "execution trigger failed");
                self.events.emit(SchedulerEvent::FlowFailed {
                    flow_id: flow.id,
                    error: err.to_string(),
                });
                (None, false, Some(err.to_string()))
            }
        };

        // A failed run still counts as a run and still gets rescheduled.
        let completed_at = self.clock.now();
        let next = match next_run(&flow.schedule, completed_at) {
            Ok(next) => next,
            Err(e) => {
                warn!(flow_id = %flow.id, error = %e,
                    "next-run computation failed; clearing next_run_at");
                None
            }
        };

        let mut schedule = flow.schedule.clone();
        schedule.rearm(next, completed_at);
        if let Err(source) = self.store.update_flow_schedule(flow.id, schedule).await {
            let err = SchedulerError::StoreAccess {
                operation: "update_flow_schedule",
                source,
            };
            // The record stays stale until the next tick re-derives the
            // same due-ness decision, bounded by the tolerance window.
            warn!(flow_id = %flow.id, error = %err, "failed to persist re-armed schedule");
        }

        self.record_run(FlowRunRecord {
            flow_id: flow.id,
            flow_name: flow.name,
            execution_id,
            success,
            error,
            scheduled_at,
            completed_at,
        });
        self.tracker.unmark(flow.id);
    }

    fn record_run(&self, run: FlowRunRecord) {
        let mut history = self.history.lock();
        if history.len() >= self.config.run_history_limit {
            history.pop_front();
        }
        history.push_back(run);
    }
}
