//! `blueprint status`: local markers, env state, missing scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use blueprint_detector::ProjectProbe;
use blueprint_scaffold::EnvStatus;

use super::resolve_root;

/// Arguments for `blueprint status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project root containing `package.json`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(&self.root)?;
        let probe = blueprint_detector::probe(&root)?;
        let catalog = blueprint_core::config::load_at(&root)?;
        let env = blueprint_scaffold::check_env_file(&root)?;

        let report = StatusReport {
            root: root.display().to_string(),
            markers: blueprint_detector::MARKERS
                .iter()
                .map(|marker| MarkerJson {
                    marker: (*marker).to_string(),
                    present: probe.state.has(marker),
                })
                .collect(),
            env: env_key(&env).to_string(),
            placeholder_keys: match &env {
                EnvStatus::Placeholders(keys) => keys.clone(),
                _ => Vec::new(),
            },
            missing_scripts: missing_scripts(&probe, &catalog),
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReport {
    root: String,
    markers: Vec<MarkerJson>,
    env: String,
    placeholder_keys: Vec<String>,
    missing_scripts: Vec<MissingScriptJson>,
}

#[derive(Serialize)]
struct MarkerJson {
    marker: String,
    present: bool,
}

#[derive(Serialize)]
struct MissingScriptJson {
    step: String,
    script: String,
}

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "marker")]
    marker: String,
    #[tabled(rename = "present")]
    present: String,
}

fn missing_scripts(
    probe: &ProjectProbe,
    catalog: &blueprint_core::StepCatalog,
) -> Vec<MissingScriptJson> {
    probe
        .missing_scripts(catalog)
        .into_iter()
        .map(|(step, script)| MissingScriptJson { step, script })
        .collect()
}

fn env_key(status: &EnvStatus) -> &'static str {
    match status {
        EnvStatus::Missing => "missing",
        EnvStatus::Placeholders(_) => "placeholders",
        EnvStatus::Configured => "configured",
    }
}

fn print_table(report: StatusReport) {
    println!("Blueprint v{} | {}", env!("CARGO_PKG_VERSION"), report.root);

    let rows: Vec<MarkerRow> = report
        .markers
        .into_iter()
        .map(|m| MarkerRow {
            marker: m.marker,
            present: if m.present {
                "yes".green().to_string()
            } else {
                "no".bright_black().to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    match report.env.as_str() {
        "configured" => println!(".env: {}", "configured".green()),
        "missing" => println!(".env: {} (run 'blueprint env init')", "missing".red()),
        _ => println!(
            ".env: {} ({} placeholder values)",
            "placeholders".yellow(),
            report.placeholder_keys.len()
        ),
    }

    if report.missing_scripts.is_empty() {
        return;
    }
    println!("{}", "Steps with undefined npm scripts:".yellow().bold());
    for missing in report.missing_scripts {
        println!("  {} -> npm script '{}'", missing.step, missing.script);
    }
}
