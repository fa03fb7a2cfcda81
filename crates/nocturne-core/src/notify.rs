//! Completion notification for supervised explorations.
//!
//! When a supervised task exits successfully the notifier waits a fixed
//! grace period, reads the summary file the task wrote, and submits its full
//! text once to the notification sink. Every failure here is logged and
//! swallowed; nothing is retried.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nocturne_types::error::NotifyError;
use nocturne_types::session::TaskExit;

use crate::fs::FileSystem;

/// Outbound notification API.
pub trait NotificationSink: Send + Sync {
    /// Submit `message` once. `MissingCredential` means nothing was sent.
    fn send(
        &self,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// What happened when a session's exit was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Summary delivered (2xx from the API).
    Delivered,
    /// Task exited non-zero; no attempt made.
    TaskFailed,
    /// Summary file missing or unreadable.
    ArtifactMissing,
    /// No notification token configured.
    Skipped,
    /// The API call failed or returned non-success.
    Failed,
}

/// Text sent to the notification API for a summary.
pub fn compose_message(summary: &str) -> String {
    format!("send sms to user with this night exploration summary:\n\n{summary}")
}

/// Reads the summary artifact and submits it once.
pub struct CompletionNotifier<N, F> {
    sink: N,
    fs: Arc<F>,
    grace_period: Duration,
}

impl<N: NotificationSink, F: FileSystem> CompletionNotifier<N, F> {
    pub fn new(sink: N, fs: Arc<F>, grace_period: Duration) -> Self {
        Self {
            sink,
            fs,
            grace_period,
        }
    }

    /// Handle a supervised task's exit.
    ///
    /// The grace period is a fixed delay, not a completion signal: a task
    /// still writing its summary after the delay is read as-is.
    pub async fn on_exit(&self, exit: TaskExit, summary_path: &Path) -> NotifyOutcome {
        if !exit.success() {
            tracing::info!(exit_code = ?exit.code, "exploration failed, no summary sent");
            return NotifyOutcome::TaskFailed;
        }

        tokio::time::sleep(self.grace_period).await;

        let summary = match self.fs.read_file(summary_path).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(
                    path = %summary_path.display(),
                    error = %e,
                    "could not read exploration summary"
                );
                return NotifyOutcome::ArtifactMissing;
            }
        };

        match self.sink.send(&compose_message(&summary)).await {
            Ok(()) => {
                tracing::info!(path = %summary_path.display(), "summary notification queued");
                NotifyOutcome::Delivered
            }
            Err(NotifyError::MissingCredential) => {
                tracing::warn!("notification token not set, skipping summary delivery");
                NotifyOutcome::Skipped
            }
            Err(e) => {
                tracing::error!(error = %e, "summary delivery failed");
                NotifyOutcome::Failed
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{MemoryFs, RecordingSink};
    use super::*;

    const SUMMARY: &str = "/explorations/2026-10-18T23-33.md";

    fn ok_exit() -> TaskExit {
        TaskExit { code: Some(0) }
    }

    #[tokio::test]
    async fn test_successful_exit_sends_exact_summary_once() {
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::with_file(SUMMARY, "# night notes\nlearned about tides"));
        let notifier = CompletionNotifier::new(sink, fs, Duration::ZERO);

        let outcome = notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await;

        assert_eq!(outcome, NotifyOutcome::Delivered);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], compose_message("# night notes\nlearned about tides"));
        assert!(sent[0].ends_with("# night notes\nlearned about tides"));
    }

    #[tokio::test]
    async fn test_failed_exit_sends_nothing() {
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::with_file(SUMMARY, "summary"));
        let notifier = CompletionNotifier::new(sink, fs, Duration::ZERO);

        let outcome = notifier
            .on_exit(TaskExit { code: Some(1) }, Path::new(SUMMARY))
            .await;

        assert_eq!(outcome, NotifyOutcome::TaskFailed);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact_sends_nothing() {
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let notifier = CompletionNotifier::new(sink, Arc::new(MemoryFs::default()), Duration::ZERO);

        let outcome = notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await;

        assert_eq!(outcome, NotifyOutcome::ArtifactMissing);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_skipped() {
        let sink = RecordingSink::failing(|| Err(NotifyError::MissingCredential));
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::with_file(SUMMARY, "summary"));
        let notifier = CompletionNotifier::new(sink, fs, Duration::ZERO);

        let outcome = notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await;

        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_delivery_is_not_retried() {
        let sink = RecordingSink::failing(|| Err(NotifyError::Rejected { status: 500 }));
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::with_file(SUMMARY, "summary"));
        let notifier = CompletionNotifier::new(sink, fs, Duration::ZERO);

        let outcome = notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await;

        assert_eq!(outcome, NotifyOutcome::Failed);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_written_after_grace_period_is_missed() {
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::default());
        let notifier = Arc::new(CompletionNotifier::new(
            sink,
            fs.clone(),
            Duration::from_secs(2),
        ));

        let handle = {
            let notifier = notifier.clone();
            tokio::spawn(async move { notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await })
        };

        // A slow writer that finishes after the grace period has elapsed.
        tokio::time::sleep(Duration::from_secs(3)).await;
        fs.files
            .lock()
            .unwrap()
            .insert(SUMMARY.into(), "late summary".to_string());

        assert_eq!(handle.await.unwrap(), NotifyOutcome::ArtifactMissing);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_summary_is_read_as_is() {
        let sink = RecordingSink::ok();
        let sent = sink.sent.clone();
        let fs = Arc::new(MemoryFs::with_file(SUMMARY, "first half"));
        let notifier = Arc::new(CompletionNotifier::new(
            sink,
            fs.clone(),
            Duration::from_secs(2),
        ));

        let outcome = notifier.on_exit(ok_exit(), Path::new(SUMMARY)).await;

        assert_eq!(outcome, NotifyOutcome::Delivered);
        assert_eq!(sent.lock().unwrap()[0], compose_message("first half"));
    }
}
