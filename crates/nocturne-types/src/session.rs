//! Exploration session states and supervision modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single exploration session.
///
/// ```text
/// Validating -> Running -> Completed -> Notified
///      \           \
///       -> Failed   -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Checking whether the trigger identifier is trusted.
    Validating,
    /// External process launched, not yet exited.
    Running,
    /// Process exited with status 0.
    Completed,
    /// Validation failed, launch failed, or the process exited non-zero.
    Failed,
    /// Summary delivered to the notification API (supervised mode only).
    Notified,
}

impl SessionState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Validating, Running)
                | (Validating, Failed)
                | (Running, Completed)
                | (Running, Failed)
                | (Completed, Notified)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Validating => "validating",
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Notified => "notified",
        };
        write!(f, "{s}")
    }
}

/// How the dispatcher treats the launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionMode {
    /// Output discarded, ownership released to the OS, no notification.
    Detached,
    /// Output piped, exit observed, summary delivered on success.
    #[default]
    Supervised,
}

impl fmt::Display for SupervisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisionMode::Detached => write!(f, "detached"),
            SupervisionMode::Supervised => write!(f, "supervised"),
        }
    }
}

impl FromStr for SupervisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detached" => Ok(SupervisionMode::Detached),
            "supervised" => Ok(SupervisionMode::Supervised),
            other => Err(format!("unknown supervision mode: '{other}'")),
        }
    }
}

/// Result of classifying a trigger identifier by its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Local invocation (manual, scheduled, or test). No upstream proof needed.
    Trusted,
    /// Upstream-supplied id that should be checked against the sleep lookup.
    NeedsLookup,
}

/// Answer from the external sleep-data lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The sleep record exists upstream.
    Confirmed,
    /// The lookup ran and did not confirm the id.
    Rejected,
    /// The lookup is not installed or did not answer in time.
    Unavailable,
}

impl LookupOutcome {
    /// Unavailability defaults to trusted so the exploration still runs.
    pub fn permits_launch(self) -> bool {
        !matches!(self, LookupOutcome::Rejected)
    }
}

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskExit {
    /// Exit code, `None` when killed by a signal or the wait itself failed.
    pub code: Option<i32>,
}

impl TaskExit {
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}
