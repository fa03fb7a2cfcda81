//! CLI command definitions for the `nocturne` binary.
//!
//! Uses clap derive macros for argument parsing. Settings that also live in
//! `nocturne.toml` can be overridden per invocation with flags or the
//! matching `NOCTURNE_*` environment variables.

pub mod sign;
pub mod status;
pub mod trigger;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use nocturne_types::config::NocturneConfig;
use nocturne_types::session::SupervisionMode;
use secrecy::SecretString;

/// Sleep-triggered night exploration service.
#[derive(Parser)]
#[command(name = "nocturne", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook receiver.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "NOCTURNE_PORT")]
        port: Option<u16>,

        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,

        /// Disable the heartbeat file and health watchdog.
        #[arg(long)]
        no_monitor: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Start one exploration by hand.
    Trigger {
        /// Trigger id. Defaults to `manual-<epoch millis>`.
        id: Option<String>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Show when the running service last wrote its heartbeat.
    Status,

    /// Compute the signature header for a webhook delivery.
    Sign {
        /// Value of the timestamp header.
        #[arg(long)]
        timestamp: String,

        /// Request body.
        #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
        body: Option<String>,

        /// Read the request body from a file.
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Credential file holding the webhook secret.
        #[arg(long, env = "NOCTURNE_CREDS_PATH")]
        creds: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Options shared by commands that may launch an exploration.
#[derive(Args, Clone, Default)]
pub struct Overrides {
    /// Credential file location.
    #[arg(long, env = "NOCTURNE_CREDS_PATH")]
    pub creds: Option<PathBuf>,

    /// Bearer token for the notification API.
    #[arg(long, env = "NOCTURNE_NOTIFY_TOKEN", hide_env_values = true)]
    pub notify_token: Option<String>,

    /// Detached or supervised exploration launch.
    #[arg(long)]
    pub mode: Option<SupervisionMode>,
}

impl Overrides {
    /// Apply the flags on top of the loaded config and return the token.
    pub fn apply(self, config: &mut NocturneConfig) -> Option<SecretString> {
        if let Some(creds) = self.creds {
            config.credentials_path = creds;
        }
        if let Some(mode) = self.mode {
            config.task.mode = mode;
        }
        self.notify_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }
}
