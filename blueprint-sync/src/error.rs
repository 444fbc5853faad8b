//! Error types for blueprint-sync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use blueprint_core::ConfigError;

/// Admission-time rejection returned synchronously by `submit`.
///
/// Per-step failures are never errors; they are recorded in the step outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Another run holds the guard. Nothing was queued.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    /// The action is not in the plan table. No step ran and the guard was
    /// never taken.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

impl SubmitError {
    pub fn reason(&self) -> RejectionReason {
        match self {
            SubmitError::AlreadyRunning => RejectionReason::AlreadyRunning,
            SubmitError::UnknownAction(_) => RejectionReason::UnknownAction,
        }
    }
}

/// Wire form of a [`SubmitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    AlreadyRunning,
    UnknownAction,
}

/// All other errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error loading the step catalog.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The run's event channel closed before `RunFinished` arrived.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),
}
