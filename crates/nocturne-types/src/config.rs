//! Configuration types for Nocturne.
//!
//! `NocturneConfig` represents the top-level `nocturne.toml` that enumerates
//! every port, path, and timeout the service uses. All fields have defaults;
//! relative paths are resolved against the data directory with
//! [`NocturneConfig::rooted_at`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::SupervisionMode;
use crate::webhook::SLEEP_UPDATED;

/// Top-level configuration, loaded from `~/.nocturne/nocturne.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NocturneConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// JSON file holding `client_id`, `client_secret`, `webhook_secret`.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub task: TaskConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

impl Default for NocturneConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            credentials_path: default_credentials_path(),
            webhook: WebhookConfig::default(),
            task: TaskConfig::default(),
            validation: ValidationConfig::default(),
            notify: NotifyConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl NocturneConfig {
    /// Resolve every relative path against `data_dir`. Absolute paths are kept.
    pub fn rooted_at(mut self, data_dir: &Path) -> Self {
        let root = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = data_dir.join(&*p);
            }
        };
        root(&mut self.credentials_path);
        root(&mut self.task.instructions_path);
        root(&mut self.task.workspace);
        root(&mut self.task.summary_dir);
        root(&mut self.monitor.heartbeat_path);
        self
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Webhook bodies larger than this are rejected before verification.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Header names and the event type that triggers an exploration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
    #[serde(default = "default_timestamp_header")]
    pub timestamp_header: String,
    #[serde(default = "default_trigger_event")]
    pub trigger_event: String,
}

fn default_signature_header() -> String {
    "x-whoop-signature".to_string()
}

fn default_timestamp_header() -> String {
    "x-whoop-signature-timestamp".to_string()
}

fn default_trigger_event() -> String {
    SLEEP_UPDATED.to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signature_header: default_signature_header(),
            timestamp_header: default_timestamp_header(),
            trigger_event: default_trigger_event(),
        }
    }
}

/// The external exploration program and how it is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Executable to start (e.g. `bash`).
    #[serde(default = "default_task_program")]
    pub program: String,
    /// Leading arguments placed before the three positional arguments.
    #[serde(default = "default_task_args")]
    pub args: Vec<String>,
    #[serde(default = "default_instructions_path")]
    pub instructions_path: PathBuf,
    /// Duration ceiling passed to the task. Not enforced here.
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
    #[serde(default)]
    pub mode: SupervisionMode,
}

fn default_task_program() -> String {
    "bash".to_string()
}

fn default_task_args() -> Vec<String> {
    vec!["run-session.sh".to_string()]
}

fn default_instructions_path() -> PathBuf {
    PathBuf::from("explorer.md")
}

fn default_max_minutes() -> u32 {
    120
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_summary_dir() -> PathBuf {
    PathBuf::from("explorations")
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            program: default_task_program(),
            args: default_task_args(),
            instructions_path: default_instructions_path(),
            max_minutes: default_max_minutes(),
            workspace: default_workspace(),
            summary_dir: default_summary_dir(),
            mode: SupervisionMode::default(),
        }
    }
}

impl TaskConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_minutes) * 60)
    }
}

/// The optional sleep-data lookup used to confirm upstream ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lookup_program")]
    pub program: String,
    #[serde(default = "default_lookup_args")]
    pub args: Vec<String>,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_lookup_program() -> String {
    "python3".to_string()
}

fn default_lookup_args() -> Vec<String> {
    vec!["whoop.py".to_string()]
}

fn default_lookup_timeout() -> u64 {
    30
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_lookup_program(),
            args: default_lookup_args(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

/// Outbound completion notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_endpoint")]
    pub endpoint: String,
    /// Wait after process exit before reading the summary file.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

fn default_notify_endpoint() -> String {
    "https://api.zo.computer/zo/ask".to_string()
}

fn default_grace_period_ms() -> u64 {
    2_000
}

fn default_notify_timeout() -> u64 {
    30
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_notify_endpoint(),
            grace_period_ms: default_grace_period_ms(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl NotifyConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Heartbeat file and self-probing watchdog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_path")]
    pub heartbeat_path: PathBuf,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_heartbeat_path() -> PathBuf {
    PathBuf::from("heartbeat")
}

fn default_heartbeat_interval_ms() -> u64 {
    5_000
}

fn default_watchdog_interval_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_path: default_heartbeat_path(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            watchdog_interval_ms: default_watchdog_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl MonitorConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
