use blueprint_scaffold::{
    check_env_file, env_path_at, render_env_template, write_env_file, EnvStatus, ScaffoldError,
};
use tempfile::TempDir;

#[test]
fn rendered_env_lists_every_section() {
    let out = render_env_template().expect("render");
    assert!(out.starts_with("# Cursor Blueprint Enforcer Environment Variables\n"));
    for heading in [
        "# Firebase Configuration",
        "# BigQuery Configuration",
        "# Neon Database Configuration",
        "# Render Configuration",
        "# MindPal Configuration",
        "# DeerFlow Configuration",
        "# Make.com Configuration",
        "# Google Workspace Configuration",
        "# Machine Sync Configuration",
        "# Development Configuration",
    ] {
        assert!(out.contains(heading), "missing {heading}");
    }
    assert!(out.contains("MAKE_BASE_URL=https://eu1.make.com/api/v2\n"));
    assert!(out.ends_with("LOG_LEVEL=info\n"));
}

#[test]
fn write_creates_env_and_leaves_no_tmp_file() {
    let dir = TempDir::new().unwrap();
    let path = write_env_file(dir.path(), false).expect("write");

    assert_eq!(path, env_path_at(dir.path()));
    assert!(path.exists());
    assert!(!dir.path().join(".env.blueprint.tmp").exists());
}

#[test]
fn existing_env_is_not_overwritten_without_force() {
    let dir = TempDir::new().unwrap();
    let path = env_path_at(dir.path());
    std::fs::write(&path, "API_KEY=real\n").unwrap();

    let err = write_env_file(dir.path(), false).unwrap_err();
    assert!(matches!(err, ScaffoldError::AlreadyExists { .. }), "{err:?}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "API_KEY=real\n");

    write_env_file(dir.path(), true).expect("forced write");
    assert!(std::fs::read_to_string(&path).unwrap().contains("NEON_HOST=your-neon-host"));
}

#[test]
fn check_reports_missing_then_placeholders_then_configured() {
    let dir = TempDir::new().unwrap();
    assert_eq!(check_env_file(dir.path()).unwrap(), EnvStatus::Missing);

    write_env_file(dir.path(), false).unwrap();
    match check_env_file(dir.path()).unwrap() {
        EnvStatus::Placeholders(keys) => {
            assert_eq!(keys.first().map(String::as_str), Some("FIREBASE_PROJECT_ID"));
            assert!(keys.iter().any(|k| k == "SYNC_ENCRYPTION_KEY"));
            assert!(!keys.iter().any(|k| k == "NODE_ENV"));
        }
        other => panic!("expected placeholders, got {other:?}"),
    }

    std::fs::write(
        env_path_at(dir.path()),
        "# Replace your-values\nNEON_HOST=db.internal\nNODE_ENV=production\n",
    )
    .unwrap();
    assert!(check_env_file(dir.path()).unwrap().is_configured());
}
