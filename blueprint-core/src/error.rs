//! Error types for blueprint-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the step catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading `blueprint.yaml`.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (dump path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse step catalog at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file parsed but describes an unusable catalog.
    #[error("invalid step catalog at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}
