//! Step catalog loading: defaults, partial overrides, parse and validation errors.

use std::fs;
use std::time::Duration;

use assert_fs::prelude::*;
use blueprint_core::{config, ConfigError, StepCatalog};
use predicates::prelude::{predicate, Predicate};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Defaults
// ---------------------------------------------------------------------------

#[test]
fn missing_file_yields_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let catalog = config::load_at(root.path()).expect("load");
    assert_eq!(catalog, StepCatalog::default());
}

#[test]
fn empty_file_yields_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("blueprint.yaml").write_str("   \n").expect("write");
    let catalog = config::load_at(root.path()).expect("load");
    assert_eq!(catalog, StepCatalog::default());
}

// ---------------------------------------------------------------------------
// 2. Overrides
// ---------------------------------------------------------------------------

#[test]
fn partial_override_keeps_remaining_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("blueprint.yaml")
        .write_str(
            "default_timeout_secs: 60\n\
             integrations:\n\
             \x20 - name: Local API\n\
             \x20   invocation: curl -fsS http://localhost:3000/health\n\
             \x20   timeout_secs: 5\n",
        )
        .expect("write");

    let catalog = config::load_at(root.path()).expect("load");
    assert_eq!(catalog.default_timeout(), Duration::from_secs(60));
    assert_eq!(catalog.integrations.len(), 1);
    assert_eq!(catalog.integrations[0].name, "Local API");
    assert_eq!(catalog.integrations[0].timeout_secs, Some(5));
    assert_eq!(catalog.cursor_import, StepCatalog::default().cursor_import);
}

#[test]
fn dumped_catalog_loads_back_unchanged() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let yaml = StepCatalog::default().to_yaml().expect("dump");
    root.child("blueprint.yaml").write_str(&yaml).expect("write");
    assert_eq!(config::load_at(root.path()).expect("load"), StepCatalog::default());
}

// ---------------------------------------------------------------------------
// 3. Errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    fs::write(
        root.path().join("blueprint.yaml"),
        b": : corrupt : yaml : !!!\n  - broken: [unclosed",
    )
    .expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(predicate::str::contains("blueprint.yaml").eval(&err.to_string()));
}

#[rstest]
#[case::zero_default_timeout("default_timeout_secs: 0\n", "default_timeout_secs")]
#[case::empty_invocation(
    "run_tests:\n  name: Run project tests\n  invocation: \"\"\n",
    "step 'Run project tests' has an empty invocation"
)]
#[case::zero_step_timeout(
    "generate_summary:\n  name: Summary\n  invocation: npm run generate-summary\n  timeout_secs: 0\n",
    "step 'Summary' has a zero timeout"
)]
#[case::duplicate_integration(
    "integrations:\n  - name: Render\n    invocation: a\n  - name: Render\n    invocation: b\n",
    "integration 'Render' is listed more than once"
)]
fn invalid_catalog_is_rejected(#[case] yaml: &str, #[case] expected: &str) {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("blueprint.yaml").write_str(yaml).expect("write");

    let err = config::load_at(root.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
    assert!(err.to_string().contains(expected), "got: {err}");
}
