//! `blueprint run`: submit an action and stream its events.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;

use blueprint_sync::{EventKind, EventSink, RunEvent, SubmitResponse};

use super::resolve_root;

/// Arguments for `blueprint run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Action to run (see `blueprint actions`).
    pub action: String,

    /// Project root containing `package.json`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Emit one JSON object per line: the submit response, then every event.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(&self.root)?;
        let probe = blueprint_detector::probe(&root)
            .with_context(|| format!("cannot run '{}'", self.action))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        let orchestrator = blueprint_sync::for_project(&root, runtime.handle().clone())
            .context("failed to load step catalog")?;

        let submitted = orchestrator.submit(&self.action, &probe.state);
        if self.json {
            print_json_line(&SubmitResponse::from_result(&submitted))?;
        }
        let handle = match submitted {
            Ok(handle) => handle,
            Err(err) => bail!("run rejected: {err}"),
        };

        let mut sink: Box<dyn EventSink> = if self.json {
            Box::new(JsonLines)
        } else {
            Box::new(ConsoleLog::default())
        };
        let summary = runtime
            .block_on(handle.forward(sink.as_mut()))
            .context("run ended without a summary")?;

        if !summary.succeeded {
            bail!("{}: {}", summary.action, summary.verdict());
        }
        Ok(())
    }
}

fn print_json_line<T: serde::Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("failed to serialize event")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("failed to write to stdout")?;
    stdout.flush().context("failed to flush stdout")
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Newline-delimited JSON, one object per event.
struct JsonLines;

impl EventSink for JsonLines {
    fn on_event(&mut self, event: &RunEvent) {
        if let Err(err) = print_json_line(event) {
            tracing::warn!(error = %err, "dropped event");
        }
    }
}

/// `[HH:MM:SS] message` lines for a terminal.
#[derive(Default)]
struct ConsoleLog {
    total_steps: usize,
}

impl ConsoleLog {
    fn line(&self, event: &RunEvent, message: impl std::fmt::Display) {
        let stamp = event.at.with_timezone(&Local).format("%H:%M:%S");
        println!("{} {message}", format!("[{stamp}]").bright_black());
    }
}

impl EventSink for ConsoleLog {
    fn on_event(&mut self, event: &RunEvent) {
        match &event.kind {
            EventKind::RunStarted {
                action,
                total_steps,
            } => {
                self.total_steps = *total_steps;
                self.line(
                    event,
                    format!("Starting {} ({total_steps} steps)", action.to_string().bold()),
                );
            }
            EventKind::StepStarted { index, name } => {
                self.line(event, format!("[{}/{}] {name}...", index + 1, self.total_steps));
            }
            EventKind::StepFinished {
                outcome,
                stderr_excerpt,
                ..
            } => {
                if outcome.succeeded {
                    self.line(
                        event,
                        format!(
                            "{} {} ({} ms)",
                            "✓".green().bold(),
                            outcome.step_name,
                            outcome.duration_ms
                        ),
                    );
                    return;
                }
                let reason = match (outcome.failure_kind, outcome.exit_code) {
                    (Some(kind), Some(code)) => format!("{kind} ({code})"),
                    (Some(kind), None) => kind.to_string(),
                    (None, _) => "failed".to_string(),
                };
                self.line(
                    event,
                    format!("{} {}: {reason}", "✗".red().bold(), outcome.step_name),
                );
                for excerpt_line in stderr_excerpt.lines() {
                    println!("           {}", excerpt_line.dimmed());
                }
            }
            EventKind::RunFinished { summary } => {
                let verdict = summary.verdict();
                let verdict = if summary.succeeded {
                    verdict.green().bold()
                } else {
                    verdict.red().bold()
                };
                self.line(
                    event,
                    format!("{} finished in {} ms: {verdict}", summary.action, summary.duration_ms),
                );
            }
        }
    }
}
