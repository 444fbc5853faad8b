//! Blueprint core library: domain types, step catalog, errors.
//!
//! - [`types`]: steps, plans, outcomes, actions, local state
//! - [`config`]: the step catalog and `blueprint.yaml` loading
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{StepCatalog, StepSpec};
pub use error::ConfigError;
pub use types::{
    Action, FailureKind, LocalState, Plan, Step, StepOutcome, UnknownActionName,
    CURSOR_CONFIG_MARKER, MACHINE_SYNC_CONFIG_MARKER, TOOL_SYNC_CONFIG_MARKER,
};
