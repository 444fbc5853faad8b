//! `blueprint plan`: preview the steps an action would run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use blueprint_sync::PlanBuilder;

use super::resolve_root;

/// Arguments for `blueprint plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Action to plan (see `blueprint actions`).
    pub action: String,

    /// Project root containing `package.json`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Emit the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "step")]
    name: String,
    #[tabled(rename = "command")]
    invocation: String,
    #[tabled(rename = "timeout")]
    timeout: String,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(&self.root)?;
        let probe = blueprint_detector::probe(&root)?;
        let catalog = blueprint_core::config::load_at(&root)?;
        let builder = PlanBuilder::new(catalog);
        let plan = builder.build_named(&self.action, &probe.state)?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        println!(
            "{} | {} steps | {}",
            plan.action().to_string().bold(),
            plan.len(),
            plan.action().description()
        );
        let rows: Vec<PlanRow> = plan
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| PlanRow {
                position: i + 1,
                name: step.name().to_string(),
                invocation: step.invocation().to_string(),
                timeout: format!("{}s", step.timeout().as_secs()),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        for (name, script) in probe.missing_scripts_for(&plan) {
            println!(
                "{} '{name}' uses npm script '{script}', which package.json does not define",
                "warning:".yellow().bold()
            );
        }
        Ok(())
    }
}
