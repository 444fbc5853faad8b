//! Command runner: executes one [`Step`] out-of-process.
//!
//! The invocation is handed to the platform shell (`sh -c` / `cmd /C`).
//! stdout and stderr are drained concurrently while the child runs so a
//! chatty process cannot block on a full pipe, and so output written before
//! a timeout is kept.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

use blueprint_core::{Step, StepOutcome};

/// Time allowed after a kill (or exit) for the child to be reaped and its
/// pipes to drain.
pub const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(2);

/// Executes a step and reports exactly one outcome. Never fails: every
/// problem is folded into the returned [`StepOutcome`].
pub trait StepRunner: Send + Sync {
    fn run(&self, step: &Step) -> impl Future<Output = StepOutcome> + Send;
}

/// Runs steps as shell commands.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
    grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            working_dir: None,
            grace: DEFAULT_CLEANUP_GRACE,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every step from `dir` (normally the project root).
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    fn command(&self, step: &Step) -> Command {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(step.invocation());
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(step.invocation());
            c
        };
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl StepRunner for ProcessRunner {
    async fn run(&self, step: &Step) -> StepOutcome {
        let started = Instant::now();

        let mut child = match self.command(step).spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(step = step.name(), error = %err, "failed to launch step");
                return StepOutcome::launch_error(
                    step,
                    format!("failed to launch '{}': {err}", step.invocation()),
                );
            }
        };
        tracing::debug!(step = step.name(), pid = ?child.id(), "step launched");

        let stdout = PipeCapture::spawn(child.stdout.take());
        let stderr = PipeCapture::spawn(child.stderr.take());

        match timeout(step.timeout(), child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout.collect(self.grace).await;
                let stderr = stderr.collect(self.grace).await;
                StepOutcome::exited(step, status.code(), stdout, stderr, started.elapsed())
            }
            Ok(Err(err)) => {
                tracing::warn!(step = step.name(), error = %err, "failed to wait for step");
                let _ = child.start_kill();
                StepOutcome::launch_error(
                    step,
                    format!("failed to wait for '{}': {err}", step.invocation()),
                )
            }
            Err(_) => {
                tracing::warn!(
                    step = step.name(),
                    timeout_secs = step.timeout().as_secs_f64(),
                    "step timed out, killing",
                );
                if let Err(err) = child.start_kill() {
                    tracing::debug!(step = step.name(), error = %err, "kill after timeout failed");
                }
                let _ = timeout(self.grace, child.wait()).await;
                let stdout = stdout.collect(self.grace).await;
                let stderr = stderr.collect(self.grace).await;
                StepOutcome::timed_out(step, stdout, stderr, started.elapsed())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pipe capture
// ---------------------------------------------------------------------------

/// Background reader for one child pipe.
///
/// Chunks are forwarded as they are read, so whatever arrived before a kill
/// is still collectable even if a grandchild keeps the pipe open.
struct PipeCapture {
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
}

impl PipeCapture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, chunks) = mpsc::unbounded_channel();
        let reader = pipe.map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8 * 1024];
                loop {
                    match pipe.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                    }
                }
            })
        });
        Self { chunks, reader }
    }

    /// Gather everything read so far, waiting at most `grace` for EOF.
    async fn collect(mut self, grace: Duration) -> String {
        let mut bytes = Vec::new();
        let reached_eof = timeout(grace, async {
            while let Some(chunk) = self.chunks.recv().await {
                bytes.extend_from_slice(&chunk);
            }
        })
        .await
        .is_ok();

        if !reached_eof {
            while let Ok(chunk) = self.chunks.try_recv() {
                bytes.extend_from_slice(&chunk);
            }
            if let Some(reader) = self.reader.take() {
                reader.abort();
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
