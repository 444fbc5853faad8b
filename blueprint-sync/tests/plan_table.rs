//! Plan builder table: every action × marker combination.

use blueprint_core::{
    Action, LocalState, CURSOR_CONFIG_MARKER, MACHINE_SYNC_CONFIG_MARKER, TOOL_SYNC_CONFIG_MARKER,
};
use blueprint_sync::{PlanBuilder, SubmitError};
use rstest::rstest;

const IMPORT: &str = "Import Cursor configuration";
const EXPORT: &str = "Export Cursor configuration";
const MACHINE: &str = "Sync machine configuration";
const TOOL: &str = "Sync tool configuration";
const GEN_MACHINE: &str = "Generate machine sync configuration";
const GEN_TOOL: &str = "Generate tool sync configuration";
const SUMMARY: &str = "Generate project summary";

fn state(cursor: bool, machine: bool, tool: bool) -> LocalState {
    LocalState::new()
        .with(CURSOR_CONFIG_MARKER, cursor)
        .with(MACHINE_SYNC_CONFIG_MARKER, machine)
        .with(TOOL_SYNC_CONFIG_MARKER, tool)
}

#[rstest]
#[case(true, &[IMPORT])]
#[case(false, &[EXPORT])]
fn sync_single_config(#[case] cursor: bool, #[case] expected: &[&str]) {
    let plan = PlanBuilder::default().build(Action::SyncSingleConfig, &state(cursor, true, true));
    assert_eq!(plan.step_names(), expected);
}

#[rstest]
#[case(state(true, false, false), &[IMPORT, SUMMARY])]
#[case(state(false, false, false), &[EXPORT, SUMMARY])]
#[case(state(true, true, false), &[IMPORT, MACHINE, SUMMARY])]
#[case(state(false, false, true), &[EXPORT, TOOL, SUMMARY])]
#[case(state(true, true, true), &[IMPORT, MACHINE, TOOL, SUMMARY])]
fn sync_everything(#[case] snapshot: LocalState, #[case] expected: &[&str]) {
    let plan = PlanBuilder::default().build(Action::SyncEverything, &snapshot);
    assert_eq!(plan.step_names(), expected);
}

#[rstest]
#[case(state(false, false, false), &[EXPORT, GEN_MACHINE, GEN_TOOL, SUMMARY])]
#[case(state(true, true, false), &[EXPORT, GEN_TOOL, SUMMARY])]
#[case(state(true, false, true), &[EXPORT, GEN_MACHINE, SUMMARY])]
#[case(state(true, true, true), &[EXPORT, SUMMARY])]
fn export_all(#[case] snapshot: LocalState, #[case] expected: &[&str]) {
    let plan = PlanBuilder::default().build(Action::ExportAll, &snapshot);
    assert_eq!(plan.step_names(), expected);
}

#[rstest]
#[case(Action::GenerateSummary, &[SUMMARY])]
#[case(Action::ExportConfig, &[EXPORT])]
#[case(Action::ImportConfig, &[IMPORT])]
#[case(Action::RunTests, &["Run project tests"])]
#[case(
    Action::SmokeTest,
    &["Cursor Config Export", "Generate Summary", "TypeScript Build", "Code Linting"]
)]
fn unconditional_actions_ignore_state(#[case] action: Action, #[case] expected: &[&str]) {
    let builder = PlanBuilder::default();
    for snapshot in [state(false, false, false), state(true, true, true)] {
        assert_eq!(builder.build(action, &snapshot).step_names(), expected);
    }
}

#[test]
fn building_is_deterministic_for_every_action() {
    let builder = PlanBuilder::default();
    for action in Action::all() {
        for bits in 0..8u8 {
            let snapshot = state(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            assert_eq!(
                builder.build(*action, &snapshot),
                builder.build(*action, &snapshot),
                "{action} with {snapshot:?}"
            );
        }
    }
}

#[test]
fn every_listed_action_resolves_by_name() {
    let builder = PlanBuilder::default();
    for action in Action::all() {
        let plan = builder
            .build_named(action.as_str(), &LocalState::new())
            .expect("known action");
        assert_eq!(plan.action(), *action);
    }
    assert!(matches!(
        builder.build_named("Sync-Everything", &LocalState::new()),
        Err(SubmitError::UnknownAction(_))
    ));
}
