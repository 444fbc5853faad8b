//! Sync orchestrator: admission, sequential execution, aggregation.
//!
//! `submit` never blocks. It resolves the action, takes the process-wide run
//! guard (or rejects), builds the plan from the caller's snapshot and spawns
//! the run on the tokio runtime. Progress comes back over the returned
//! [`RunHandle`].
//!
//! The guard and the terminal event are owned by a drop guard inside the
//! run task, so they are released/emitted on every exit path: normal
//! completion, a panicking runner, or the task being dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use blueprint_core::{Action, LocalState, Plan, StepOutcome};

use crate::error::{RejectionReason, SubmitError, SyncError};
use crate::events::{stderr_excerpt, EventKind, EventSink, RunEvent, RunSummary};
use crate::planner::PlanBuilder;
use crate::runner::StepRunner;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Admits at most one run at a time and executes it in the background.
pub struct Orchestrator<R> {
    planner: Arc<PlanBuilder>,
    runner: Arc<R>,
    in_progress: Arc<AtomicBool>,
    next_run_id: Arc<AtomicU64>,
    runtime: Handle,
}

impl<R> Clone for Orchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            planner: self.planner.clone(),
            runner: self.runner.clone(),
            in_progress: self.in_progress.clone(),
            next_run_id: self.next_run_id.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<R> Orchestrator<R>
where
    R: StepRunner + 'static,
{
    /// Runs are spawned on `runtime`, so `submit` may be called from any
    /// thread, inside the runtime or not.
    pub fn new(planner: PlanBuilder, runner: R, runtime: Handle) -> Self {
        Self {
            planner: Arc::new(planner),
            runner: Arc::new(runner),
            in_progress: Arc::new(AtomicBool::new(false)),
            next_run_id: Arc::new(AtomicU64::new(1)),
            runtime,
        }
    }

    /// Whether a run currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Admit and start a run for `action`.
    ///
    /// Unknown actions are rejected before the guard is touched. A request
    /// arriving while another run holds the guard is rejected, not queued.
    pub fn submit(&self, action: &str, state: &LocalState) -> Result<RunHandle, SubmitError> {
        let action: Action = action.parse().map_err(|_| {
            tracing::warn!(action, "rejected unknown action");
            SubmitError::UnknownAction(action.to_string())
        })?;

        let lease = RunLease::acquire(&self.in_progress).ok_or_else(|| {
            tracing::warn!(action = %action, "rejected: a run is already in progress");
            SubmitError::AlreadyRunning
        })?;

        let plan = self.planner.build(action, state);
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        tracing::info!(run_id, action = %action, steps = plan.len(), "run admitted");

        let (tx, events) = mpsc::unbounded_channel();
        let scope = RunScope::open(run_id, &plan, lease, tx);
        let task = self
            .runtime
            .spawn(execute_plan(plan, self.runner.clone(), scope));

        Ok(RunHandle {
            run_id,
            action,
            events,
            task,
        })
    }
}

async fn execute_plan<R: StepRunner>(plan: Plan, runner: Arc<R>, mut scope: RunScope) {
    scope.emit(EventKind::RunStarted {
        action: plan.action(),
        total_steps: plan.len(),
    });

    for (index, step) in plan.steps().iter().enumerate() {
        scope.emit(EventKind::StepStarted {
            index,
            name: step.name().to_string(),
        });

        let outcome = runner.run(step).await;
        if outcome.succeeded {
            tracing::info!(run_id = scope.run_id, step = step.name(), "step succeeded");
        } else {
            tracing::warn!(
                run_id = scope.run_id,
                step = step.name(),
                failure = ?outcome.failure_kind,
                exit_code = ?outcome.exit_code,
                "step failed, continuing",
            );
        }

        scope.emit(EventKind::StepFinished {
            index,
            stderr_excerpt: stderr_excerpt(&outcome.stderr),
            outcome: outcome.clone(),
        });
        scope.outcomes.push(outcome);
    }

    scope.completed = true;
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Ownership of the `in_progress` flag. Dropping it releases the flag.
struct RunLease {
    flag: Arc<AtomicBool>,
}

impl RunLease {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Run-local state. On drop: release the guard, then emit `RunFinished`.
struct RunScope {
    run_id: u64,
    action: Action,
    total_steps: usize,
    started: Instant,
    outcomes: Vec<StepOutcome>,
    completed: bool,
    lease: Option<RunLease>,
    events: mpsc::UnboundedSender<RunEvent>,
}

impl RunScope {
    fn open(
        run_id: u64,
        plan: &Plan,
        lease: RunLease,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> Self {
        Self {
            run_id,
            action: plan.action(),
            total_steps: plan.len(),
            started: Instant::now(),
            outcomes: Vec::with_capacity(plan.len()),
            completed: false,
            lease: Some(lease),
            events,
        }
    }

    fn emit(&self, kind: EventKind) {
        // A dropped receiver only means nobody is watching; the run goes on.
        let _ = self.events.send(RunEvent::now(self.run_id, kind));
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        drop(self.lease.take());

        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let summary = RunSummary::from_outcomes(
            self.action,
            self.total_steps,
            &self.outcomes,
            !self.completed,
            duration_ms,
        );
        if summary.interrupted {
            tracing::error!(
                run_id = self.run_id,
                executed = summary.executed_steps,
                total = summary.total_steps,
                "run interrupted",
            );
        } else {
            tracing::info!(
                run_id = self.run_id,
                action = %summary.action,
                succeeded = summary.succeeded,
                failed = summary.failed_step_names.len(),
                duration_ms,
                "run finished",
            );
        }
        self.emit(EventKind::RunFinished { summary });
    }
}

// ---------------------------------------------------------------------------
// RunHandle
// ---------------------------------------------------------------------------

/// Caller's view of an admitted run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: u64,
    action: Action,
    events: mpsc::UnboundedReceiver<RunEvent>,
    task: JoinHandle<()>,
}

impl RunHandle {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Next event, or `None` once the run has emitted `RunFinished` and
    /// shut down.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Blocking variant of [`next_event`](Self::next_event) for callers
    /// outside the runtime (e.g. a UI thread).
    pub fn blocking_next_event(&mut self) -> Option<RunEvent> {
        self.events.blocking_recv()
    }

    /// Deliver every event to `sink` in order and return the final summary.
    pub async fn forward<S>(mut self, sink: &mut S) -> Result<RunSummary, SyncError>
    where
        S: EventSink + ?Sized,
    {
        while let Some(event) = self.events.recv().await {
            sink.on_event(&event);
            if let EventKind::RunFinished { summary } = event.kind {
                if let Err(err) = self.task.await {
                    tracing::error!(run_id = self.run_id, error = %err, "run task ended abnormally");
                }
                return Ok(summary);
            }
        }
        Err(SyncError::ChannelClosed("run events"))
    }

    /// Discard progress and wait for the summary.
    pub async fn wait(self) -> Result<RunSummary, SyncError> {
        self.forward(&mut |_: &RunEvent| {}).await
    }
}

// ---------------------------------------------------------------------------
// Submit boundary record
// ---------------------------------------------------------------------------

/// `{accepted, rejection_reason?}` as exposed to callers over JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<RejectionReason>,
}

impl SubmitResponse {
    pub fn from_result(result: &Result<RunHandle, SubmitError>) -> Self {
        match result {
            Ok(_) => Self {
                accepted: true,
                rejection_reason: None,
            },
            Err(err) => Self {
                accepted: false,
                rejection_reason: Some(err.reason()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use blueprint_core::Step;

    use super::*;

    /// Exit code per step name (default 0); every step sleeps `delay`.
    struct ScriptedRunner {
        codes: HashMap<String, i32>,
        delay: Duration,
    }

    impl StepRunner for ScriptedRunner {
        async fn run(&self, step: &Step) -> StepOutcome {
            tokio::time::sleep(self.delay).await;
            let code = self.codes.get(step.name()).copied().unwrap_or(0);
            StepOutcome::exited(step, Some(code), String::new(), String::new(), self.delay)
        }
    }

    fn orchestrator(delay: Duration) -> Orchestrator<ScriptedRunner> {
        Orchestrator::new(
            PlanBuilder::default(),
            ScriptedRunner {
                codes: HashMap::new(),
                delay,
            },
            Handle::current(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_running_is_rejected() {
        let orch = orchestrator(Duration::from_secs(1));
        let first = orch
            .submit("generate-summary", &LocalState::new())
            .expect("first run admitted");
        assert!(orch.is_running());

        let second = orch.submit("export-all", &LocalState::new());
        assert_eq!(second.unwrap_err(), SubmitError::AlreadyRunning);

        first.wait().await.expect("summary");
        assert!(!orch.is_running());
        orch.submit("export-all", &LocalState::new())
            .expect("admitted after release")
            .wait()
            .await
            .expect("summary");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_action_never_takes_the_guard() {
        let orch = orchestrator(Duration::ZERO);
        let err = orch.submit("sync-nonexistent", &LocalState::new()).unwrap_err();
        assert_eq!(err, SubmitError::UnknownAction("sync-nonexistent".into()));
        assert!(!orch.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_is_released_before_run_finished_is_observed() {
        let orch = orchestrator(Duration::from_millis(10));
        let handle = orch.submit("export-all", &LocalState::new()).expect("admitted");
        let watcher = orch.clone();
        let mut released_at_finish = None;
        handle
            .forward(&mut |event: &RunEvent| {
                if event.is_terminal() {
                    released_at_finish = Some(!watcher.is_running());
                }
            })
            .await
            .expect("summary");
        assert_eq!(released_at_finish, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn next_event_ends_after_run_finished() {
        let orch = orchestrator(Duration::from_millis(5));
        let mut handle = orch
            .submit("generate-summary", &LocalState::new())
            .expect("admitted");

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4, "{events:?}");
        assert!(events[..3].iter().all(|e| !e.is_terminal()));
        assert!(events[3].is_terminal());
    }

    #[test]
    fn submit_response_mirrors_rejection() {
        let rejected: Result<RunHandle, SubmitError> = Err(SubmitError::AlreadyRunning);
        let json = serde_json::to_value(SubmitResponse::from_result(&rejected)).expect("json");
        assert_eq!(json["accepted"], false);
        assert_eq!(json["rejection_reason"], "AlreadyRunning");
    }
}
