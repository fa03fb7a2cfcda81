//! Process spawner for the external exploration program.
//!
//! Implements [`TaskSpawner`] with `tokio::process`:
//! - **Detached**: stdio discarded, the child gets its own process group and
//!   the handle is dropped immediately. Nothing in this process waits on it.
//! - **Supervised**: stdout/stderr are piped and forwarded line by line into
//!   tracing; a background task waits for the exit and reports it once.

use std::process::Stdio;

use nocturne_core::task::{SpawnedTask, TaskInvocation, TaskSpawner, SUMMARY_PATH_ENV};
use nocturne_types::error::DispatchError;
use nocturne_types::session::{SupervisionMode, TaskExit};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;

/// Spawns exploration processes on the local host.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpawner;

impl ProcessSpawner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &TaskInvocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(invocation.argv())
            .env(SUMMARY_PATH_ENV, &invocation.summary_path)
            .stdin(Stdio::null());
        cmd
    }
}

impl TaskSpawner for ProcessSpawner {
    fn spawn(
        &self,
        invocation: &TaskInvocation,
        mode: SupervisionMode,
    ) -> Result<SpawnedTask, DispatchError> {
        let mut cmd = Self::command(invocation);
        let spawn_failed = |e: std::io::Error| DispatchError::SpawnFailed {
            program: invocation.program.clone(),
            reason: e.to_string(),
        };

        match mode {
            SupervisionMode::Detached => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
                #[cfg(unix)]
                cmd.process_group(0);

                let child = cmd.spawn().map_err(spawn_failed)?;
                let pid = child.id();
                // Dropping a tokio Child without kill_on_drop leaves the
                // process running; the runtime reaps it when it exits.
                drop(child);
                Ok(SpawnedTask::Detached { pid })
            }
            SupervisionMode::Supervised => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

                let mut child = cmd.spawn().map_err(spawn_failed)?;
                let pid = child.id();

                if let Some(stdout) = child.stdout.take() {
                    tokio::spawn(forward_output(stdout, invocation.trigger_id.clone(), "stdout"));
                }
                if let Some(stderr) = child.stderr.take() {
                    tokio::spawn(forward_output(stderr, invocation.trigger_id.clone(), "stderr"));
                }

                let (tx, rx) = oneshot::channel();
                let trigger_id = invocation.trigger_id.clone();
                tokio::spawn(async move {
                    let exit = match child.wait().await {
                        Ok(status) => TaskExit {
                            code: status.code(),
                        },
                        Err(e) => {
                            tracing::error!(trigger_id = %trigger_id, error = %e, "failed to wait for exploration process");
                            TaskExit { code: None }
                        }
                    };
                    // The receiver is gone only if the dispatcher stopped caring.
                    let _ = tx.send(exit);
                });

                Ok(SpawnedTask::Supervised { pid, exit: rx })
            }
        }
    }
}

/// Forward each line of a child stream into tracing until EOF.
async fn forward_output<R>(stream: R, trigger_id: String, stream_name: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::debug!(trigger_id = %trigger_id, stream = stream_name, "{line}");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(trigger_id = %trigger_id, stream = stream_name, error = %e, "stopped reading task output");
                break;
            }
        }
    }
}
