//! Secret bundle read from the local credential file.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Client credentials and the webhook signing secret.
///
/// Loaded fresh for every webhook delivery and dropped when the request
/// finishes. All three values are wrapped in [`SecretString`] so they never
/// show up in `Debug` output or logs.
#[derive(Debug)]
pub struct Credentials {
    pub client_id: SecretString,
    pub client_secret: SecretString,
    pub webhook_secret: SecretString,
}

/// On-disk shape of the credential file.
#[derive(Deserialize)]
struct RawCredentials {
    client_id: String,
    client_secret: String,
    webhook_secret: String,
}

impl Credentials {
    /// Parse the JSON credential bundle.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawCredentials = serde_json::from_str(text)?;
        Ok(Self {
            client_id: SecretString::from(raw.client_id),
            client_secret: SecretString::from(raw.client_secret),
            webhook_secret: SecretString::from(raw.webhook_secret),
        })
    }

    /// The HMAC key used to sign webhook deliveries.
    pub fn webhook_key(&self) -> &[u8] {
        self.webhook_secret.expose_secret().as_bytes()
    }
}
