//! `blueprint actions`: list recognized actions.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use blueprint_core::Action;

/// Arguments for `blueprint actions`.
#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct ActionRow {
    #[tabled(rename = "action")]
    name: &'static str,
    #[tabled(rename = "description")]
    description: &'static str,
}

impl ActionsArgs {
    pub fn run(self) -> Result<()> {
        let rows: Vec<ActionRow> = Action::all()
            .iter()
            .map(|action| ActionRow {
                name: action.as_str(),
                description: action.description(),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize actions JSON")?
            );
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
