//! # blueprint-scaffold
//!
//! Tera-based scaffolding for project files the sync steps depend on,
//! currently the placeholder `.env` holding integration credentials.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use blueprint_scaffold::{check_env_file, write_env_file, EnvStatus};
//!
//! fn ensure_env(root: &Path) {
//!     if let Ok(EnvStatus::Missing) = check_env_file(root) {
//!         let _ = write_env_file(root, false);
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod env_file;
pub mod error;

pub use context::{EnvContext, EnvEntry, EnvSection};
pub use engine::{render_env_template, Scaffolder};
pub use env_file::{check_env_file, env_path_at, write_env_file, write_env_file_with, EnvStatus};
pub use error::ScaffoldError;
