//! Plan builder: `(action, local state) -> Plan`.
//!
//! Pure and deterministic. Every condition is evaluated once against the
//! snapshot it is given; nothing here touches the filesystem.
//!
//! | Action             | Steps                                                        |
//! |--------------------|--------------------------------------------------------------|
//! | sync-single-config | import if `cursor-config` present, else export               |
//! | sync-everything    | cursor step, machine sync if present, tool sync if present, summary |
//! | export-all         | export, machine sync if absent, tool sync if absent, summary |
//! | test-integrations  | one health check per integration, in catalog order          |
//! | generate-summary   | summary                                                      |
//! | export-config      | export                                                       |
//! | import-config      | import                                                       |
//! | run-tests          | test suite                                                   |
//! | smoke-test         | smoke steps, in catalog order                                |

use blueprint_core::{
    Action, LocalState, Plan, Step, StepCatalog, StepSpec, CURSOR_CONFIG_MARKER,
    MACHINE_SYNC_CONFIG_MARKER, TOOL_SYNC_CONFIG_MARKER,
};

use crate::error::SubmitError;

/// Builds fresh plans from a step catalog.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    catalog: StepCatalog,
}

impl PlanBuilder {
    pub fn new(catalog: StepCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    /// Resolve an action name, then build its plan.
    pub fn build_named(&self, action: &str, state: &LocalState) -> Result<Plan, SubmitError> {
        let action: Action = action
            .parse()
            .map_err(|_| SubmitError::UnknownAction(action.to_string()))?;
        Ok(self.build(action, state))
    }

    pub fn build(&self, action: Action, state: &LocalState) -> Plan {
        let c = &self.catalog;
        let mut steps = Vec::new();

        match action {
            Action::SyncSingleConfig => {
                steps.push(self.step(self.cursor_sync_spec(state)));
            }
            Action::SyncEverything => {
                steps.push(self.step(self.cursor_sync_spec(state)));
                if state.has(MACHINE_SYNC_CONFIG_MARKER) {
                    steps.push(self.step(&c.machine_sync));
                }
                if state.has(TOOL_SYNC_CONFIG_MARKER) {
                    steps.push(self.step(&c.tool_sync));
                }
                steps.push(self.step(&c.generate_summary));
            }
            Action::ExportAll => {
                steps.push(self.step(&c.cursor_export));
                if !state.has(MACHINE_SYNC_CONFIG_MARKER) {
                    steps.push(self.step(&c.machine_sync_generate));
                }
                if !state.has(TOOL_SYNC_CONFIG_MARKER) {
                    steps.push(self.step(&c.tool_sync_generate));
                }
                steps.push(self.step(&c.generate_summary));
            }
            Action::TestIntegrations => {
                steps.extend(c.integrations.iter().map(|integration| {
                    Step::new(
                        format!("Test {}", integration.name),
                        integration.invocation.clone(),
                        self.step(integration).timeout(),
                    )
                }));
            }
            Action::GenerateSummary => steps.push(self.step(&c.generate_summary)),
            Action::ExportConfig => steps.push(self.step(&c.cursor_export)),
            Action::ImportConfig => steps.push(self.step(&c.cursor_import)),
            Action::RunTests => steps.push(self.step(&c.run_tests)),
            Action::SmokeTest => steps.extend(c.smoke_tests.iter().map(|spec| self.step(spec))),
        }

        Plan::new(action, steps)
    }

    fn cursor_sync_spec(&self, state: &LocalState) -> &StepSpec {
        if state.has(CURSOR_CONFIG_MARKER) {
            &self.catalog.cursor_import
        } else {
            &self.catalog.cursor_export
        }
    }

    fn step(&self, spec: &StepSpec) -> Step {
        spec.to_step(self.catalog.default_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(cursor: bool, machine: bool, tool: bool) -> LocalState {
        LocalState::new()
            .with(CURSOR_CONFIG_MARKER, cursor)
            .with(MACHINE_SYNC_CONFIG_MARKER, machine)
            .with(TOOL_SYNC_CONFIG_MARKER, tool)
    }

    #[test]
    fn sync_everything_with_only_cursor_config() {
        let plan = PlanBuilder::default().build(Action::SyncEverything, &state(true, false, false));
        assert_eq!(
            plan.step_names(),
            ["Import Cursor configuration", "Generate project summary"]
        );
    }

    #[test]
    fn export_all_on_fresh_machine_generates_both_configs() {
        let plan = PlanBuilder::default().build(Action::ExportAll, &LocalState::new());
        assert_eq!(
            plan.step_names(),
            [
                "Export Cursor configuration",
                "Generate machine sync configuration",
                "Generate tool sync configuration",
                "Generate project summary",
            ]
        );
    }

    #[test]
    fn integrations_are_prefixed_and_keep_catalog_order() {
        let plan = PlanBuilder::default().build(Action::TestIntegrations, &LocalState::new());
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.steps()[0].name(), "Test Google Workspace");
        assert_eq!(plan.steps()[4].invocation(), "npm run make:health");
    }

    #[test]
    fn no_integrations_is_an_empty_plan() {
        let builder = PlanBuilder::new(StepCatalog {
            integrations: vec![],
            ..StepCatalog::default()
        });
        assert!(builder.build(Action::TestIntegrations, &LocalState::new()).is_empty());
    }

    #[test]
    fn unknown_name_is_an_error_not_an_empty_plan() {
        let err = PlanBuilder::default()
            .build_named("sync-nonexistent", &LocalState::new())
            .unwrap_err();
        assert_eq!(err, SubmitError::UnknownAction("sync-nonexistent".into()));
    }
}
