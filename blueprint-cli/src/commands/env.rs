//! `blueprint env`: scaffold and check the project's `.env`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use blueprint_scaffold::{check_env_file, write_env_file, EnvStatus};

use super::resolve_root;

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Write a `.env` with placeholder credentials.
    Init {
        /// Overwrite an existing `.env`.
        #[arg(long)]
        force: bool,

        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Report whether `.env` still holds placeholder values. Exits non-zero
    /// unless it is fully configured.
    Check {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

pub fn run(command: EnvCommand) -> Result<()> {
    match command {
        EnvCommand::Init { force, root } => {
            let root = resolve_root(&root)?;
            let path = write_env_file(&root, force)?;
            println!("{} wrote {}", "✓".green().bold(), path.display());
            println!("Edit it with your actual credentials.");
            Ok(())
        }
        EnvCommand::Check { root } => {
            let root = resolve_root(&root)?;
            match check_env_file(&root)? {
                EnvStatus::Configured => {
                    println!("{} .env is configured", "✓".green().bold());
                    Ok(())
                }
                EnvStatus::Missing => bail!(".env not found (run 'blueprint env init')"),
                EnvStatus::Placeholders(keys) => {
                    for key in &keys {
                        println!("  {} {key}", "placeholder:".yellow());
                    }
                    bail!(".env contains {} placeholder values", keys.len())
                }
            }
        }
    }
}
