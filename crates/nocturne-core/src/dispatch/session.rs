//! Exploration session handle and state tracking.
//!
//! A [`TriggerSession`] is the caller's view of one exploration: its fixed
//! parameters plus a live view of its [`SessionState`]. The dispatcher keeps
//! the matching [`SessionControl`] and drops it once it stops supervising,
//! which is what [`TriggerSession::settled`] waits for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use nocturne_types::session::{SessionState, SupervisionMode};
use tokio::sync::watch;
use uuid::Uuid;

/// Summary file for a session started at `start_time`.
///
/// Derived from the start minute only, so two sessions starting in the same
/// minute share a path.
pub fn summary_path_for(summary_dir: &Path, start_time: DateTime<Utc>) -> PathBuf {
    summary_dir.join(format!("{}.md", start_time.format("%Y-%m-%dT%H-%M")))
}

/// One exploration session.
#[derive(Debug, Clone)]
pub struct TriggerSession {
    pub id: Uuid,
    pub trigger_id: String,
    pub start_time: DateTime<Utc>,
    pub max_duration: Duration,
    pub workspace_path: PathBuf,
    pub summary_path: PathBuf,
    pub mode: SupervisionMode,
    state: watch::Receiver<SessionState>,
}

/// Parameters fixed at session creation.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub trigger_id: String,
    pub start_time: DateTime<Utc>,
    pub max_duration: Duration,
    pub workspace_path: PathBuf,
    pub summary_path: PathBuf,
    pub mode: SupervisionMode,
}

impl TriggerSession {
    /// Create a session in `Validating` along with its control half.
    pub fn new(spec: SessionSpec) -> (Self, SessionControl) {
        let id = Uuid::now_v7();
        let (tx, rx) = watch::channel(SessionState::Validating);
        let session = Self {
            id,
            trigger_id: spec.trigger_id.clone(),
            start_time: spec.start_time,
            max_duration: spec.max_duration,
            workspace_path: spec.workspace_path,
            summary_path: spec.summary_path,
            mode: spec.mode,
            state: rx,
        };
        let control = SessionControl {
            id,
            trigger_id: spec.trigger_id,
            tx,
        };
        (session, control)
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the dispatcher stops tracking this session and return the
    /// final state.
    ///
    /// Detached sessions settle as soon as they are `Running`; supervised
    /// sessions settle after the exit has been handled.
    pub async fn settled(&mut self) -> SessionState {
        while self.state.changed().await.is_ok() {}
        *self.state.borrow()
    }
}

/// Write side of a session's state. Owned by the dispatcher.
#[derive(Debug)]
pub struct SessionControl {
    id: Uuid,
    trigger_id: String,
    tx: watch::Sender<SessionState>,
}

impl SessionControl {
    pub fn state(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Move to `next` if the transition is legal. Returns whether it applied.
    pub fn advance(&self, next: SessionState) -> bool {
        let current = self.state();
        if !current.can_transition_to(next) {
            tracing::warn!(
                session_id = %self.id,
                trigger_id = %self.trigger_id,
                from = %current,
                to = %next,
                "ignored illegal session transition"
            );
            return false;
        }
        self.tx.send_replace(next);
        tracing::debug!(
            session_id = %self.id,
            trigger_id = %self.trigger_id,
            from = %current,
            to = %next,
            "session state changed"
        );
        true
    }
}
