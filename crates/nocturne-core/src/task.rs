//! Task spawner trait and the invocation contract for the exploration program.

use std::path::PathBuf;

use nocturne_types::error::DispatchError;
use nocturne_types::session::{SupervisionMode, TaskExit};
use tokio::sync::oneshot;

/// Environment variable carrying the summary path to the child.
pub const SUMMARY_PATH_ENV: &str = "NOCTURNE_SUMMARY_PATH";

/// Everything needed to start one exploration process.
///
/// The child sees `program args.. <trigger_id> <max_minutes> <workspace>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub trigger_id: String,
    pub max_minutes: u32,
    pub workspace: PathBuf,
    pub summary_path: PathBuf,
}

impl TaskInvocation {
    /// The three positional arguments appended after `args`.
    pub fn positional_args(&self) -> [String; 3] {
        [
            self.trigger_id.clone(),
            self.max_minutes.to_string(),
            self.workspace.display().to_string(),
        ]
    }

    /// Full argument vector passed to `program`.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        argv.extend(self.positional_args());
        argv
    }
}

/// A started exploration process.
#[derive(Debug)]
pub enum SpawnedTask {
    /// Ownership released to the OS. Nothing to join.
    Detached { pid: Option<u32> },
    /// Exit is reported once through `exit`.
    Supervised {
        pid: Option<u32>,
        exit: oneshot::Receiver<TaskExit>,
    },
}

/// Starts the external exploration program.
///
/// Both supervision modes live behind this one method; the mode comes from
/// configuration. Must be called from within a tokio runtime.
pub trait TaskSpawner: Send + Sync {
    fn spawn(
        &self,
        invocation: &TaskInvocation,
        mode: SupervisionMode,
    ) -> Result<SpawnedTask, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_appends_positional_args() {
        let invocation = TaskInvocation {
            program: "bash".to_string(),
            args: vec!["run-session.sh".to_string()],
            trigger_id: "manual-1".to_string(),
            max_minutes: 120,
            workspace: PathBuf::from("/home/workspace/Projects"),
            summary_path: PathBuf::from("/tmp/summary.md"),
        };
        assert_eq!(
            invocation.argv(),
            vec![
                "run-session.sh",
                "manual-1",
                "120",
                "/home/workspace/Projects"
            ]
        );
    }
}
