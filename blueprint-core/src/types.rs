//! Domain types for blueprint sync runs.
//!
//! A [`Plan`] is an ordered list of [`Step`]s built for one [`Action`] from a
//! [`LocalState`] snapshot. Executing a step yields exactly one
//! [`StepOutcome`]. All types are serializable so runs can be rendered as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Local state markers
// ---------------------------------------------------------------------------

/// Marker key: a local cursor configuration export exists.
pub const CURSOR_CONFIG_MARKER: &str = "cursor-config";
/// Marker key: the machine sync config file exists.
pub const MACHINE_SYNC_CONFIG_MARKER: &str = "machine-sync-config.json";
/// Marker key: the tool sync config file exists.
pub const TOOL_SYNC_CONFIG_MARKER: &str = "tool-sync-config.json";

/// Snapshot of boolean presence markers, supplied by the caller.
///
/// Unknown or absent keys read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalState(BTreeMap<String, bool>);

impl LocalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, marker: impl Into<String>, present: bool) -> Self {
        self.set(marker, present);
        self
    }

    pub fn set(&mut self, marker: impl Into<String>, present: bool) {
        self.0.insert(marker.into(), present);
    }

    pub fn has(&self, marker: &str) -> bool {
        self.0.get(marker).copied().unwrap_or(false)
    }

    pub fn markers(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for LocalState {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A user-requested operation recognised by the plan builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    SyncSingleConfig,
    SyncEverything,
    ExportAll,
    TestIntegrations,
    GenerateSummary,
    ExportConfig,
    ImportConfig,
    RunTests,
    SmokeTest,
}

impl Action {
    /// All actions in a stable order.
    pub fn all() -> &'static [Action] {
        &[
            Action::SyncSingleConfig,
            Action::SyncEverything,
            Action::ExportAll,
            Action::TestIntegrations,
            Action::GenerateSummary,
            Action::ExportConfig,
            Action::ImportConfig,
            Action::RunTests,
            Action::SmokeTest,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SyncSingleConfig => "sync-single-config",
            Action::SyncEverything => "sync-everything",
            Action::ExportAll => "export-all",
            Action::TestIntegrations => "test-integrations",
            Action::GenerateSummary => "generate-summary",
            Action::ExportConfig => "export-config",
            Action::ImportConfig => "import-config",
            Action::RunTests => "run-tests",
            Action::SmokeTest => "smoke-test",
        }
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            Action::SyncSingleConfig => "Import the cursor config if one exists locally, else export it",
            Action::SyncEverything => "Sync cursor, machine and tool config, then regenerate the summary",
            Action::ExportAll => "Export cursor config, generate missing sync configs, regenerate the summary",
            Action::TestIntegrations => "Health-check every configured integration",
            Action::GenerateSummary => "Regenerate the project summary",
            Action::ExportConfig => "Export the cursor config",
            Action::ImportConfig => "Import the cursor config",
            Action::RunTests => "Run the project test suite",
            Action::SmokeTest => "Quick check that export, summary, build and lint work",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an action name that is not in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionName(pub String);

impl fmt::Display for UnknownActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownActionName {}

impl FromStr for Action {
    type Err = UnknownActionName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownActionName(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One opaque external operation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    name: String,
    invocation: String,
    #[serde(with = "duration_secs")]
    timeout: Duration,
}

impl Step {
    pub fn new(name: impl Into<String>, invocation: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            invocation: invocation.into(),
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command line handed to the shell.
    pub fn invocation(&self) -> &str {
        &self.invocation
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Ordered, immutable sequence of steps for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    action: Action,
    steps: Vec<Step>,
}

impl Plan {
    pub fn new(action: Action, steps: Vec<Step>) -> Self {
        Self { action, steps }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Why a step did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NonZeroExit,
    LaunchError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timed out"),
            FailureKind::NonZeroExit => write!(f, "non-zero exit"),
            FailureKind::LaunchError => write!(f, "launch error"),
        }
    }
}

/// Result of executing one [`Step`].
///
/// Build one through [`exited`](Self::exited), [`timed_out`](Self::timed_out)
/// or [`launch_error`](Self::launch_error): they keep `failure_kind` `Some`
/// exactly when `succeeded` is false. The fields are public for reading and
/// serialization; writing them directly bypasses that pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl StepOutcome {
    /// Outcome for a process that exited within its timeout.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    pub fn exited(
        step: &Step,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        let succeeded = exit_code == Some(0);
        Self {
            step_name: step.name().to_owned(),
            succeeded,
            stdout,
            stderr,
            failure_kind: (!succeeded).then_some(FailureKind::NonZeroExit),
            exit_code,
            duration_ms: millis(duration),
        }
    }

    pub fn timed_out(step: &Step, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            step_name: step.name().to_owned(),
            succeeded: false,
            stdout,
            stderr,
            failure_kind: Some(FailureKind::Timeout),
            exit_code: None,
            duration_ms: millis(duration),
        }
    }

    /// The process could not be started; `message` lands in `stderr`.
    pub fn launch_error(step: &Step, message: impl Into<String>) -> Self {
        Self {
            step_name: step.name().to_owned(),
            succeeded: false,
            stdout: String::new(),
            stderr: message.into(),
            failure_kind: Some(FailureKind::LaunchError),
            exit_code: None,
            duration_ms: 0,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
