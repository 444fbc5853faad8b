//! Blueprint: run project sync actions from the command line.
//!
//! # Usage
//!
//! ```text
//! blueprint run <action> [--root DIR] [--json]
//! blueprint plan <action> [--root DIR] [--json]
//! blueprint actions [--json]
//! blueprint status [--root DIR] [--json]
//! blueprint env init [--force] [--root DIR]
//! blueprint env check [--root DIR]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    actions::ActionsArgs, env::EnvCommand, plan::PlanArgs, run::RunArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "blueprint",
    version,
    about = "Run configuration sync actions for a blueprint project",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins if set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit an action and stream its progress until it finishes.
    Run(RunArgs),

    /// Show the steps an action would run, without running them.
    Plan(PlanArgs),

    /// List recognized actions.
    Actions(ActionsArgs),

    /// Show local configuration markers and missing npm scripts.
    Status(StatusArgs),

    /// Scaffold or check the project's `.env`.
    Env {
        #[command(subcommand)]
        command: EnvCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Actions(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Env { command } => commands::env::run(command),
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
