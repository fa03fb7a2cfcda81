//! JSON credential file reader.
//!
//! The credential file is owned by an external tool; this service only ever
//! reads it, and reads it again for every webhook delivery.

use std::path::PathBuf;

use nocturne_core::credentials::CredentialStore;
use nocturne_types::credentials::Credentials;
use nocturne_types::error::CredentialError;

/// Reads `{client_id, client_secret, webhook_secret}` from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for JsonCredentialStore {
    async fn load(&self) -> Result<Credentials, CredentialError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound(self.path.display().to_string()));
            }
            Err(err) => return Err(CredentialError::Unreadable(err.to_string())),
        };

        // serde_json errors carry line/column only, never the offending value.
        Credentials::from_json(&text).map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}
