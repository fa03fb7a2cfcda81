//! Exploration dispatcher.
//!
//! `ExplorationDispatcher` turns a trigger id into a running exploration:
//! it classifies the id, confirms upstream ids against the sleep lookup,
//! checks the task instructions, computes the summary path, and starts the
//! external program through a [`TaskSpawner`]. In supervised mode it also
//! watches the exit and hands successful runs to the [`CompletionNotifier`].
//!
//! There is no mutual exclusion between sessions: two triggers in quick
//! succession start two processes.

pub mod policy;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use nocturne_types::config::TaskConfig;
use nocturne_types::error::DispatchError;
use nocturne_types::session::{SessionState, TaskExit, TrustDecision};
use tokio::sync::oneshot;

use crate::fs::FileSystem;
use crate::lookup::SleepLookup;
use crate::notify::{CompletionNotifier, NotificationSink, NotifyOutcome};
use crate::task::{SpawnedTask, TaskInvocation, TaskSpawner};

use self::policy::classify_trigger;
use self::session::{summary_path_for, SessionControl, SessionSpec, TriggerSession};

/// Fire-and-forget entry point used by the webhook handler.
///
/// Object-safe so the HTTP layer can hold an `Arc<dyn TriggerDispatch>`
/// and tests can substitute a spy.
pub trait TriggerDispatch: Send + Sync {
    /// Start an exploration in the background and return immediately.
    fn dispatch(&self, trigger_id: String);
}

/// Starts exploration sessions.
pub struct ExplorationDispatcher<L, S, N, F> {
    task: Arc<TaskConfig>,
    lookup: Arc<L>,
    spawner: Arc<S>,
    notifier: Arc<CompletionNotifier<N, F>>,
    fs: Arc<F>,
}

impl<L, S, N, F> Clone for ExplorationDispatcher<L, S, N, F> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            lookup: Arc::clone(&self.lookup),
            spawner: Arc::clone(&self.spawner),
            notifier: Arc::clone(&self.notifier),
            fs: Arc::clone(&self.fs),
        }
    }
}

impl<L, S, N, F> ExplorationDispatcher<L, S, N, F>
where
    L: SleepLookup + 'static,
    S: TaskSpawner + 'static,
    N: NotificationSink + 'static,
    F: FileSystem + 'static,
{
    pub fn new(
        task: TaskConfig,
        lookup: L,
        spawner: S,
        notifier: CompletionNotifier<N, F>,
        fs: Arc<F>,
    ) -> Self {
        Self {
            task: Arc::new(task),
            lookup: Arc::new(lookup),
            spawner: Arc::new(spawner),
            notifier: Arc::new(notifier),
            fs,
        }
    }

    /// Start one exploration for `trigger_id`.
    ///
    /// Returns once the session is `Running` or `Failed`. Never waits for the
    /// external process; in supervised mode completion is handled on a
    /// background task.
    pub async fn trigger(&self, trigger_id: &str) -> TriggerSession {
        let start_time = Utc::now();
        let summary_path = summary_path_for(&self.task.summary_dir, start_time);
        let (session, control) = TriggerSession::new(SessionSpec {
            trigger_id: trigger_id.to_string(),
            start_time,
            max_duration: self.task.max_duration(),
            workspace_path: self.task.workspace.clone(),
            summary_path: summary_path.clone(),
            mode: self.task.mode,
        });

        tracing::info!(
            session_id = %session.id,
            trigger_id = %trigger_id,
            mode = %self.task.mode,
            "exploration triggered"
        );

        if let Err(e) = self.validate(trigger_id).await {
            tracing::warn!(trigger_id = %trigger_id, error = %e, "trigger validation failed, skipping exploration");
            control.advance(SessionState::Failed);
            return session;
        }

        self.check_instructions().await;

        let invocation = TaskInvocation {
            program: self.task.program.clone(),
            args: self.task.args.clone(),
            trigger_id: trigger_id.to_string(),
            max_minutes: self.task.max_minutes,
            workspace: self.task.workspace.clone(),
            summary_path: summary_path.clone(),
        };

        match self.spawner.spawn(&invocation, self.task.mode) {
            Err(e) => {
                tracing::error!(trigger_id = %trigger_id, error = %e, "failed to start exploration");
                control.advance(SessionState::Failed);
            }
            Ok(SpawnedTask::Detached { pid }) => {
                control.advance(SessionState::Running);
                tracing::info!(
                    trigger_id = %trigger_id,
                    pid = ?pid,
                    summary = %summary_path.display(),
                    "exploration spawned detached"
                );
                // Ownership of the process is released; dropping the control
                // settles the session at Running.
                drop(control);
            }
            Ok(SpawnedTask::Supervised { pid, exit }) => {
                control.advance(SessionState::Running);
                tracing::info!(
                    trigger_id = %trigger_id,
                    pid = ?pid,
                    max_minutes = self.task.max_minutes,
                    summary = %summary_path.display(),
                    "exploration running"
                );
                tokio::spawn(supervise(
                    control,
                    exit,
                    Arc::clone(&self.notifier),
                    summary_path,
                ));
            }
        }

        session
    }

    async fn validate(&self, trigger_id: &str) -> Result<(), DispatchError> {
        match classify_trigger(trigger_id) {
            TrustDecision::Trusted => Ok(()),
            TrustDecision::NeedsLookup => {
                let outcome = self.lookup.lookup(trigger_id).await;
                tracing::debug!(trigger_id = %trigger_id, outcome = ?outcome, "sleep lookup answered");
                if outcome.permits_launch() {
                    Ok(())
                } else {
                    Err(DispatchError::Rejected(trigger_id.to_string()))
                }
            }
        }
    }

    async fn check_instructions(&self) {
        let path: &PathBuf = &self.task.instructions_path;
        match self.fs.read_file(path).await {
            Ok(_) => tracing::debug!(path = %path.display(), "exploration instructions loaded"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not load exploration instructions"
            ),
        }
    }
}

impl<L, S, N, F> TriggerDispatch for ExplorationDispatcher<L, S, N, F>
where
    L: SleepLookup + 'static,
    S: TaskSpawner + 'static,
    N: NotificationSink + 'static,
    F: FileSystem + 'static,
{
    fn dispatch(&self, trigger_id: String) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.trigger(&trigger_id).await;
        });
    }
}

/// Observe a supervised process until it exits, then notify on success.
async fn supervise<N, F>(
    control: SessionControl,
    exit: oneshot::Receiver<TaskExit>,
    notifier: Arc<CompletionNotifier<N, F>>,
    summary_path: PathBuf,
) where
    N: NotificationSink,
    F: FileSystem,
{
    let exit = exit.await.unwrap_or(TaskExit { code: None });
    tracing::info!(exit_code = ?exit.code, "exploration session ended");

    if exit.success() {
        control.advance(SessionState::Completed);
    } else {
        control.advance(SessionState::Failed);
    }

    if notifier.on_exit(exit, &summary_path).await == NotifyOutcome::Delivered {
        control.advance(SessionState::Notified);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use nocturne_types::session::{LookupOutcome, SupervisionMode};

    use super::*;
    use crate::notify::compose_message;
    use crate::notify::testing::{MemoryFs, RecordingSink};

    struct SpyLookup {
        calls: Arc<AtomicUsize>,
        outcome: LookupOutcome,
    }

    impl SpyLookup {
        fn answering(outcome: LookupOutcome) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                    outcome,
                },
                calls,
            )
        }
    }

    impl SleepLookup for SpyLookup {
        async fn lookup(&self, _sleep_id: &str) -> LookupOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    /// Records invocations. Supervised spawns hand their exit sender to the test.
    #[derive(Default)]
    struct RecordingSpawner {
        invocations: Arc<Mutex<Vec<(TaskInvocation, SupervisionMode)>>>,
        exits: Arc<Mutex<Vec<oneshot::Sender<TaskExit>>>>,
        fail: bool,
    }

    impl TaskSpawner for RecordingSpawner {
        fn spawn(
            &self,
            invocation: &TaskInvocation,
            mode: SupervisionMode,
        ) -> Result<SpawnedTask, DispatchError> {
            if self.fail {
                return Err(DispatchError::SpawnFailed {
                    program: invocation.program.clone(),
                    reason: "No such file or directory".to_string(),
                });
            }
            self.invocations
                .lock()
                .unwrap()
                .push((invocation.clone(), mode));
            match mode {
                SupervisionMode::Detached => Ok(SpawnedTask::Detached { pid: Some(4242) }),
                SupervisionMode::Supervised => {
                    let (tx, rx) = oneshot::channel();
                    self.exits.lock().unwrap().push(tx);
                    Ok(SpawnedTask::Supervised {
                        pid: Some(4242),
                        exit: rx,
                    })
                }
            }
        }
    }

    fn task_config(mode: SupervisionMode) -> TaskConfig {
        TaskConfig {
            program: "bash".to_string(),
            args: vec!["run-session.sh".to_string()],
            instructions_path: PathBuf::from("/skill/explorer.md"),
            max_minutes: 120,
            workspace: PathBuf::from("/workspace"),
            summary_dir: PathBuf::from("/explorations"),
            mode,
        }
    }

    type TestDispatcher = ExplorationDispatcher<SpyLookup, RecordingSpawner, RecordingSink, MemoryFs>;

    fn dispatcher(
        mode: SupervisionMode,
        lookup: SpyLookup,
        spawner: RecordingSpawner,
        sink: RecordingSink,
        fs: MemoryFs,
    ) -> TestDispatcher {
        let fs = Arc::new(fs);
        let notifier = CompletionNotifier::new(sink, Arc::clone(&fs), Duration::ZERO);
        ExplorationDispatcher::new(task_config(mode), lookup, spawner, notifier, fs)
    }

    #[tokio::test]
    async fn test_manual_trigger_skips_lookup() {
        let (lookup, calls) = SpyLookup::answering(LookupOutcome::Rejected);
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            RecordingSpawner::default(),
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let session = d.trigger("manual-123").await;

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_trigger_consults_lookup() {
        let (lookup, calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            RecordingSpawner::default(),
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let session = d.trigger("93845").await;

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_lookup_still_launches() {
        let (lookup, calls) = SpyLookup::answering(LookupOutcome::Unavailable);
        let spawner = RecordingSpawner::default();
        let invocations = spawner.invocations.clone();
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let session = d.trigger("93845").await;

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(invocations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_lookup_fails_without_spawning() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Rejected);
        let spawner = RecordingSpawner::default();
        let invocations = spawner.invocations.clone();
        let d = dispatcher(
            SupervisionMode::Supervised,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let mut session = d.trigger("93845").await;

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.settled().await, SessionState::Failed);
        assert!(invocations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_marks_session_failed() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner {
            fail: true,
            ..RecordingSpawner::default()
        };
        let d = dispatcher(
            SupervisionMode::Supervised,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let session = d.trigger("manual-1").await;

        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_invocation_carries_positional_args_and_summary_path() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner::default();
        let invocations = spawner.invocations.clone();
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let session = d.trigger("scheduled-nightly").await;

        let recorded = invocations.lock().unwrap();
        let (invocation, mode) = &recorded[0];
        assert_eq!(*mode, SupervisionMode::Detached);
        assert_eq!(
            invocation.argv(),
            vec!["run-session.sh", "scheduled-nightly", "120", "/workspace"]
        );
        assert_eq!(invocation.summary_path, session.summary_path);
        assert!(session.summary_path.starts_with("/explorations"));
        assert_eq!(session.max_duration, Duration::from_secs(7200));
    }

    #[tokio::test]
    async fn test_detached_session_settles_at_running() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            RecordingSpawner::default(),
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let mut session = d.trigger("manual-1").await;

        assert_eq!(session.settled().await, SessionState::Running);
    }

    #[tokio::test]
    async fn test_supervised_success_notifies_with_summary() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner::default();
        let exits = spawner.exits.clone();
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let d = dispatcher(
            SupervisionMode::Supervised,
            lookup,
            spawner,
            sink,
            MemoryFs::default(),
        );

        let mut session = d.trigger("manual-1").await;
        assert_eq!(session.state(), SessionState::Running);

        // The stub task writes its summary, then exits 0.
        d.fs.files
            .lock()
            .unwrap()
            .insert(session.summary_path.clone(), "tonight: octopus cognition".to_string());
        let tx = exits.lock().unwrap().pop().unwrap();
        tx.send(TaskExit { code: Some(0) }).unwrap();

        assert_eq!(session.settled().await, SessionState::Notified);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], compose_message("tonight: octopus cognition"));
    }

    #[tokio::test]
    async fn test_supervised_nonzero_exit_fails_without_notification() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner::default();
        let exits = spawner.exits.clone();
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let d = dispatcher(
            SupervisionMode::Supervised,
            lookup,
            spawner,
            sink,
            MemoryFs::default(),
        );

        let mut session = d.trigger("manual-1").await;
        let tx = exits.lock().unwrap().pop().unwrap();
        tx.send(TaskExit { code: Some(3) }).unwrap();

        assert_eq!(session.settled().await, SessionState::Failed);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_supervised_missing_summary_stays_completed() {
        let (lookup, _calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner::default();
        let exits = spawner.exits.clone();
        let d = dispatcher(
            SupervisionMode::Supervised,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let mut session = d.trigger("manual-1").await;
        exits
            .lock()
            .unwrap()
            .pop()
            .unwrap()
            .send(TaskExit { code: Some(0) })
            .unwrap();

        assert_eq!(session.settled().await, SessionState::Completed);
    }

    #[tokio::test]
    async fn test_dispatch_returns_before_trigger_runs() {
        let (lookup, calls) = SpyLookup::answering(LookupOutcome::Confirmed);
        let spawner = RecordingSpawner::default();
        let invocations = spawner.invocations.clone();
        let d = dispatcher(
            SupervisionMode::Detached,
            lookup,
            spawner,
            RecordingSink::ok(),
            MemoryFs::default(),
        );

        let started = Instant::now();
        d.dispatch("93845".to_string());
        assert!(started.elapsed() < Duration::from_millis(50));

        for _ in 0..100 {
            if !invocations.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(invocations.lock().unwrap().len(), 1);
    }
}
