//! Sleep lookup backed by the biometric CLI.
//!
//! Runs `{program} {args..} sleep-details <id>` and maps the result:
//! exit 0 confirms the id, any other exit rejects it, and a CLI that cannot
//! be started or does not answer within the timeout is `Unavailable`.

use std::process::Stdio;
use std::time::Duration;

use nocturne_core::lookup::SleepLookup;
use nocturne_types::config::ValidationConfig;
use nocturne_types::session::LookupOutcome;
use tokio::process::Command;

/// Subcommand the biometric CLI exposes for a single sleep record.
const SLEEP_DETAILS: &str = "sleep-details";

/// Sleep lookup that shells out to an external CLI.
#[derive(Debug, Clone)]
pub struct CommandSleepLookup {
    config: Option<ValidationConfig>,
}

impl CommandSleepLookup {
    /// Build from config. A disabled config answers `Unavailable` for every id.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config: config.enabled.then_some(config),
        }
    }
}

impl SleepLookup for CommandSleepLookup {
    async fn lookup(&self, sleep_id: &str) -> LookupOutcome {
        let Some(config) = &self.config else {
            tracing::info!("sleep validation skipped (lookup disabled)");
            return LookupOutcome::Unavailable;
        };

        let child = Command::new(&config.program)
            .args(&config.args)
            .arg(SLEEP_DETAILS)
            .arg(sleep_id)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::info!(program = %config.program, error = %e, "sleep validation skipped (lookup not available)");
                return LookupOutcome::Unavailable;
            }
        };

        match tokio::time::timeout(Duration::from_secs(config.timeout_secs), child.wait()).await {
            Ok(Ok(status)) if status.success() => LookupOutcome::Confirmed,
            Ok(Ok(status)) => {
                tracing::info!(sleep_id = %sleep_id, status = %status, "sleep lookup did not confirm id");
                LookupOutcome::Rejected
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "sleep lookup wait failed, proceeding");
                LookupOutcome::Unavailable
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = config.timeout_secs,
                    "sleep lookup timed out, proceeding"
                );
                LookupOutcome::Unavailable
            }
        }
    }
}
