//! # blueprint-sync
//!
//! Sync orchestration engine.
//!
//! Build a [`PlanBuilder`] from the project's step catalog, wrap it with a
//! [`ProcessRunner`] in an [`Orchestrator`], then [`Orchestrator::submit`] an
//! action together with the caller's [`LocalState`](blueprint_core::LocalState)
//! snapshot. The returned [`RunHandle`] streams [`RunEvent`]s and resolves to a
//! [`RunSummary`].

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod planner;
pub mod runner;

pub use error::{RejectionReason, SubmitError, SyncError};
pub use events::{EventKind, EventSink, RunEvent, RunSummary};
pub use orchestrator::{Orchestrator, RunHandle, SubmitResponse};
pub use planner::PlanBuilder;
pub use runner::{ProcessRunner, StepRunner};

use std::path::Path;

use tokio::runtime::Handle;

/// Orchestrator for the project at `root`: its catalog, its working directory.
pub fn for_project(root: &Path, runtime: Handle) -> Result<Orchestrator<ProcessRunner>, SyncError> {
    let catalog = blueprint_core::config::load_at(root)?;
    Ok(Orchestrator::new(
        PlanBuilder::new(catalog),
        ProcessRunner::new().with_working_dir(root),
        runtime,
    ))
}
