//! Writing and checking the project's `.env`.
//!
//! Writes go to `<root>/.env.blueprint.tmp` first and are renamed into place,
//! so a crash never leaves a truncated `.env` behind.

use std::path::{Path, PathBuf};

use crate::context::EnvContext;
use crate::engine::Scaffolder;
use crate::error::{io_err, ScaffoldError};

pub const ENV_FILE_NAME: &str = ".env";
const TMP_FILE_NAME: &str = ".env.blueprint.tmp";

/// Values containing this marker are unfilled placeholders.
pub const PLACEHOLDER_MARKER: &str = "your-";

pub fn env_path_at(root: &Path) -> PathBuf {
    root.join(ENV_FILE_NAME)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Scaffold `<root>/.env` with placeholder values. Returns the written path.
pub fn write_env_file(root: &Path, force: bool) -> Result<PathBuf, ScaffoldError> {
    write_env_file_with(root, &EnvContext::placeholders(), force)
}

pub fn write_env_file_with(
    root: &Path,
    ctx: &EnvContext,
    force: bool,
) -> Result<PathBuf, ScaffoldError> {
    let path = env_path_at(root);
    if path.exists() && !force {
        return Err(ScaffoldError::AlreadyExists { path });
    }
    let content = Scaffolder::new()?.render_env(ctx)?;
    atomic_write(&path, &root.join(TMP_FILE_NAME), &content)?;
    tracing::info!(path = %path.display(), overwritten = force, "wrote env file");
    Ok(path)
}

fn atomic_write(path: &Path, tmp: &Path, content: &str) -> Result<(), ScaffoldError> {
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Checking
// ---------------------------------------------------------------------------

/// Configuration state of `<root>/.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvStatus {
    Missing,
    /// Keys whose values still contain a placeholder, in file order.
    Placeholders(Vec<String>),
    Configured,
}

impl EnvStatus {
    pub fn is_configured(&self) -> bool {
        matches!(self, EnvStatus::Configured)
    }
}

pub fn check_env_file(root: &Path) -> Result<EnvStatus, ScaffoldError> {
    let path = env_path_at(root);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EnvStatus::Missing),
        Err(e) => return Err(io_err(&path, e)),
    };

    let keys = placeholder_keys(&content);
    tracing::debug!(path = %path.display(), placeholders = keys.len(), "checked env file");
    if keys.is_empty() {
        Ok(EnvStatus::Configured)
    } else {
        Ok(EnvStatus::Placeholders(keys))
    }
}

fn placeholder_keys(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter(|(_, value)| value.contains(PLACEHOLDER_MARKER))
        .map(|(key, _)| key.trim().trim_start_matches("export ").to_string())
        .collect()
}
