use thiserror::Error;

/// Errors reading the credential file.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file not found: {0}")]
    NotFound(String),

    #[error("credential file unreadable: {0}")]
    Unreadable(String),

    #[error("credential file malformed: {0}")]
    Malformed(String),
}

/// Errors starting an exploration.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("trigger '{0}' rejected by sleep lookup")]
    Rejected(String),
}

/// Errors delivering the completion notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification token not configured")]
    MissingCredential,

    #[error("notification API returned status {status}")]
    Rejected { status: u16 },

    #[error("notification request failed: {0}")]
    Transport(String),
}
