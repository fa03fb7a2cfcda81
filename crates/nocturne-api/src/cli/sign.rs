//! `nocturne sign` - compute a webhook signature for a hand-made delivery.

use std::path::PathBuf;

use anyhow::{Context, Result};
use nocturne_core::credentials::CredentialStore;
use nocturne_infra::credentials::JsonCredentialStore;
use nocturne_infra::signature;

/// Print the base64 signature of `timestamp ++ body` under the webhook secret.
pub async fn sign(
    creds_path: PathBuf,
    timestamp: &str,
    body: Option<String>,
    body_file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let body = match (body, body_file) {
        (Some(body), _) => body.into_bytes(),
        (None, Some(path)) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --body or --body-file is required"),
    };

    let credentials = JsonCredentialStore::new(creds_path).load().await?;
    let sig = signature::sign(credentials.webhook_key(), timestamp, &body)?;

    if json {
        let out = serde_json::json!({ "timestamp": timestamp, "signature": sig });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{sig}");
    }
    Ok(())
}
