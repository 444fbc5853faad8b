pub mod actions;
pub mod env;
pub mod plan;
pub mod run;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Absolute form of `--root`, so logs and errors name the real directory.
pub(crate) fn resolve_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("project root '{}' is not accessible", root.display()))
}
