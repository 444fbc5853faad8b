//! Step catalog: which command each step runs and how long it may take.
//!
//! # Storage layout
//!
//! ```text
//! <project root>/
//!   package.json
//!   blueprint.yaml     (optional, overrides any subset of the defaults)
//! ```
//!
//! Without `blueprint.yaml` the catalog reproduces the npm scripts of a
//! stock blueprint project. Omitted fields keep their defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Step;

/// File name of the per-project catalog override.
pub const CONFIG_FILE_NAME: &str = "blueprint.yaml";

/// Timeout applied to steps that do not set their own (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Timeout for each smoke-test step.
pub const SMOKE_TEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One configurable step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    pub invocation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StepSpec {
    pub fn new(name: &str, invocation: &str) -> Self {
        Self {
            name: name.to_owned(),
            invocation: invocation.to_owned(),
            timeout_secs: None,
        }
    }

    fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build an immutable [`Step`], falling back to `default_timeout`.
    pub fn to_step(&self, default_timeout: Duration) -> Step {
        let timeout = self
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);
        Step::new(self.name.clone(), self.invocation.clone(), timeout)
    }
}

/// Every step the plan builder can select from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepCatalog {
    pub default_timeout_secs: u64,
    pub cursor_import: StepSpec,
    pub cursor_export: StepSpec,
    pub machine_sync: StepSpec,
    /// Same command as `machine_sync`, labelled for the export flow.
    pub machine_sync_generate: StepSpec,
    pub tool_sync: StepSpec,
    /// Same command as `tool_sync`, labelled for the export flow.
    pub tool_sync_generate: StepSpec,
    pub generate_summary: StepSpec,
    pub run_tests: StepSpec,
    pub smoke_tests: Vec<StepSpec>,
    /// Health checks, run in this order. `name` is the integration name.
    pub integrations: Vec<StepSpec>,
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cursor_import: StepSpec::new("Import Cursor configuration", "npm run sync-cursor import"),
            cursor_export: StepSpec::new("Export Cursor configuration", "npm run sync-cursor export"),
            machine_sync: StepSpec::new("Sync machine configuration", "npm run sync-machines"),
            machine_sync_generate: StepSpec::new(
                "Generate machine sync configuration",
                "npm run sync-machines",
            ),
            tool_sync: StepSpec::new("Sync tool configuration", "npm run sync-tools"),
            tool_sync_generate: StepSpec::new("Generate tool sync configuration", "npm run sync-tools"),
            generate_summary: StepSpec::new("Generate project summary", "npm run generate-summary"),
            run_tests: StepSpec::new("Run project tests", "npm test"),
            smoke_tests: vec![
                StepSpec::new("Cursor Config Export", "npm run sync-cursor export")
                    .with_timeout(SMOKE_TEST_TIMEOUT_SECS),
                StepSpec::new("Generate Summary", "npm run generate-summary")
                    .with_timeout(SMOKE_TEST_TIMEOUT_SECS),
                StepSpec::new("TypeScript Build", "npm run build").with_timeout(SMOKE_TEST_TIMEOUT_SECS),
                StepSpec::new("Code Linting", "npm run lint").with_timeout(SMOKE_TEST_TIMEOUT_SECS),
            ],
            integrations: vec![
                StepSpec::new("Google Workspace", "npm run google:health"),
                StepSpec::new("MindPal", "npm run mindpal:health"),
                StepSpec::new("DeerFlow", "npm run deerflow:health"),
                StepSpec::new("Render", "npm run render:health"),
                StepSpec::new("Make.com", "npm run make:health"),
            ],
        }
    }
}

impl StepCatalog {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Every step spec in the catalog, for validation and listings.
    pub fn all_specs(&self) -> impl Iterator<Item = &StepSpec> {
        [
            &self.cursor_import,
            &self.cursor_export,
            &self.machine_sync,
            &self.machine_sync_generate,
            &self.tool_sync,
            &self.tool_sync_generate,
            &self.generate_summary,
            &self.run_tests,
        ]
        .into_iter()
        .chain(self.smoke_tests.iter())
        .chain(self.integrations.iter())
    }

    /// Reject empty names/invocations, zero timeouts and duplicate
    /// integration names.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        if self.default_timeout_secs == 0 {
            return Err(invalid("default_timeout_secs must be greater than zero".into()));
        }
        for spec in self.all_specs() {
            if spec.name.trim().is_empty() {
                return Err(invalid(format!(
                    "step with invocation '{}' has an empty name",
                    spec.invocation
                )));
            }
            if spec.invocation.trim().is_empty() {
                return Err(invalid(format!("step '{}' has an empty invocation", spec.name)));
            }
            if spec.timeout_secs == Some(0) {
                return Err(invalid(format!("step '{}' has a zero timeout", spec.name)));
            }
        }

        let mut seen = HashSet::new();
        for integration in &self.integrations {
            if !seen.insert(integration.name.as_str()) {
                return Err(invalid(format!(
                    "integration '{}' is listed more than once",
                    integration.name
                )));
            }
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<root>/blueprint.yaml`. Pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the catalog for the project at `root`.
///
/// Returns the defaults when `blueprint.yaml` is absent,
/// `ConfigError::Parse` (with path + line context) if it is malformed, and
/// `ConfigError::Invalid` if it parses but fails validation.
pub fn load_at(root: &Path) -> Result<StepCatalog, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(StepCatalog::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let catalog: StepCatalog = if contents.trim().is_empty() {
        StepCatalog::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?
    };
    catalog.validate(&path)?;
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
