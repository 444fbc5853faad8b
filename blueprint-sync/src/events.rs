//! Run events and the sink contract.
//!
//! A run emits, in order: one `RunStarted`, then a `StepStarted` /
//! `StepFinished` pair per step in plan order, then exactly one
//! `RunFinished`, which is always last.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use blueprint_core::{Action, StepOutcome};

/// Characters of stderr kept in [`EventKind::StepFinished`].
pub const STDERR_EXCERPT_CHARS: usize = 400;

/// One timestamped event of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub at: DateTime<Utc>,
    pub run_id: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl RunEvent {
    pub fn now(run_id: u64, kind: EventKind) -> Self {
        Self {
            at: Utc::now(),
            run_id,
            kind,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::RunFinished { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    RunStarted {
        action: Action,
        total_steps: usize,
    },
    StepStarted {
        index: usize,
        name: String,
    },
    StepFinished {
        index: usize,
        outcome: StepOutcome,
        stderr_excerpt: String,
    },
    RunFinished {
        summary: RunSummary,
    },
}

/// Aggregate result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub action: Action,
    /// True iff the plan ran to the end and every step succeeded.
    pub succeeded: bool,
    pub total_steps: usize,
    pub executed_steps: usize,
    /// Names of failed steps, in step order.
    pub failed_step_names: Vec<String>,
    /// The run stopped on an internal fault before every step executed.
    pub interrupted: bool,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn from_outcomes(
        action: Action,
        total_steps: usize,
        outcomes: &[StepOutcome],
        interrupted: bool,
        duration_ms: u64,
    ) -> Self {
        let failed_step_names: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.step_name.clone())
            .collect();
        Self {
            action,
            succeeded: !interrupted && failed_step_names.is_empty(),
            total_steps,
            executed_steps: outcomes.len(),
            failed_step_names,
            interrupted,
            duration_ms,
        }
    }

    /// `"success"`, or `"N of M steps failed, see log"`.
    pub fn verdict(&self) -> String {
        if self.succeeded {
            return "success".to_string();
        }
        if self.interrupted && self.failed_step_names.is_empty() {
            return format!(
                "interrupted after {} of {} steps, see log",
                self.executed_steps, self.total_steps
            );
        }
        format!(
            "{} of {} steps failed, see log",
            self.failed_step_names.len(),
            self.total_steps
        )
    }
}

/// Consumer of a run's event stream, e.g. a presentation layer.
pub trait EventSink {
    fn on_event(&mut self, event: &RunEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&RunEvent),
{
    fn on_event(&mut self, event: &RunEvent) {
        self(event)
    }
}

/// Trimmed tail of `stderr`, at most [`STDERR_EXCERPT_CHARS`] characters.
pub fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - STDERR_EXCERPT_CHARS).collect();
    format!("…{tail}")
}
