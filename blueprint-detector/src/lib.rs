//! Local state detection for `blueprint-detector`.
//!
//! [`probe`] inspects a project root and returns the [`LocalState`] snapshot
//! the orchestrator plans against, plus the npm scripts declared in
//! `package.json`. The orchestrator itself never touches the filesystem;
//! callers probe once and pass the snapshot in.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use blueprint_core::{
    LocalState, Plan, StepCatalog, CURSOR_CONFIG_MARKER, MACHINE_SYNC_CONFIG_MARKER,
    TOOL_SYNC_CONFIG_MARKER,
};
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Markers probed under the project root, in display order.
pub const MARKERS: &[&str] = &[
    CURSOR_CONFIG_MARKER,
    MACHINE_SYNC_CONFIG_MARKER,
    TOOL_SYNC_CONFIG_MARKER,
];

/// Result of probing a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProbe {
    pub root: PathBuf,
    pub state: LocalState,
    /// Script names from `package.json` (`npm run <name>`).
    pub scripts: BTreeSet<String>,
}

impl ProjectProbe {
    /// Catalog steps whose `npm run <script>` / `npm test` target is not
    /// declared in `package.json`, as `(step name, script)` pairs.
    ///
    /// Invocations that are not npm scripts are ignored.
    pub fn missing_scripts(&self, catalog: &StepCatalog) -> Vec<(String, String)> {
        catalog
            .all_specs()
            .filter_map(|spec| self.undeclared(&spec.name, &spec.invocation))
            .collect()
    }

    /// Same check over the steps of a built plan, in plan order. Names are
    /// the plan's step names (e.g. `Test MindPal` for an integration).
    pub fn missing_scripts_for(&self, plan: &Plan) -> Vec<(String, String)> {
        plan.steps()
            .iter()
            .filter_map(|step| self.undeclared(step.name(), step.invocation()))
            .collect()
    }

    fn undeclared(&self, name: &str, invocation: &str) -> Option<(String, String)> {
        let script = npm_script_name(invocation)?;
        (!self.scripts.contains(script)).then(|| (name.to_string(), script.to_string()))
    }
}

/// Errors from local state detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("'{path}' is not a blueprint project: no package.json found")]
    NotAProjectRoot { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fail with [`DetectError::NotAProjectRoot`] unless `root/package.json` exists.
pub fn ensure_project_root(root: &Path) -> Result<(), DetectError> {
    if root.join("package.json").is_file() {
        Ok(())
    } else {
        Err(DetectError::NotAProjectRoot {
            path: root.to_path_buf(),
        })
    }
}

/// Snapshot the marker files under `root`. Pure presence checks.
pub fn local_state(root: &Path) -> LocalState {
    MARKERS
        .iter()
        .map(|marker| (*marker, root.join(marker).exists()))
        .collect()
}

/// Probe the project at `root`: validate it, snapshot markers, read scripts.
pub fn probe(root: &Path) -> Result<ProjectProbe, DetectError> {
    ensure_project_root(root)?;
    Ok(ProjectProbe {
        root: root.to_path_buf(),
        state: local_state(root),
        scripts: read_scripts(&root.join("package.json"))?,
    })
}

// ---------------------------------------------------------------------------
// package.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: serde_json::Map<String, serde_json::Value>,
}

fn read_scripts(path: &Path) -> Result<BTreeSet<String>, DetectError> {
    let content = fs::read_to_string(path).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let package: PackageJson =
        serde_json::from_str(&content).map_err(|e| DetectError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(package.scripts.into_iter().map(|(name, _)| name).collect())
}

/// `npm run <script> [args]` → `script`; `npm test` → `test`.
fn npm_script_name(invocation: &str) -> Option<&str> {
    let mut words = invocation.split_whitespace();
    if words.next()? != "npm" {
        return None;
    }
    match words.next()? {
        "run" | "run-script" => words.next(),
        "test" | "t" => Some("test"),
        _ => None,
    }
}
