//! Error types for blueprint-scaffold.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while rendering or writing scaffolding.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while writing or reading a scaffolded file.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The target exists and overwriting was not requested.
    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ScaffoldError {
    ScaffoldError::Io {
        path: path.into(),
        source,
    }
}
