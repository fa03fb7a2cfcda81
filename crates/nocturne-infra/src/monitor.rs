//! Liveness monitor: heartbeat file and `/health` watchdog.
//!
//! Both loops run as background tasks next to the HTTP server and stop when
//! their [`CancellationToken`] is cancelled. The heartbeat stamps the current
//! time into a file every interval. The watchdog probes the server's own
//! `/health` endpoint and returns the first failure to its caller, which is
//! expected to exit the process so an external supervisor restarts it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest period either loop will tick at. `tokio::time::interval` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Why a health probe failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    #[error("health endpoint returned status {0}")]
    Status(u16),

    #[error("health probe timed out")]
    Timeout,

    #[error("health probe could not connect: {0}")]
    Connection(String),
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// Overwrite the heartbeat file with `at` as epoch milliseconds.
///
/// Writes a sibling temp file and renames it over the target so readers
/// never observe a partial write.
pub async fn write_heartbeat(path: &Path, at: DateTime<Utc>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, at.timestamp_millis().to_string()).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Read the last heartbeat. `None` if the file is missing or unparseable.
pub async fn read_heartbeat(path: &Path) -> Option<DateTime<Utc>> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    let millis: i64 = content.trim().parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Stamp the heartbeat file every `interval` until cancelled.
///
/// The first beat is written immediately. Written values never decrease,
/// even if the wall clock steps backwards.
pub async fn run_heartbeat(path: PathBuf, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = DateTime::<Utc>::MIN_UTC;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let now = Utc::now().max(last);
                match write_heartbeat(&path, now).await {
                    Ok(()) => last = now,
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to write heartbeat"),
                }
            }
        }
    }
    tracing::debug!("heartbeat stopped");
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Watchdog
// ---------------------------------------------------------------------------

/// `/health` URL for a listener bound to `addr`.
///
/// A wildcard bind (`0.0.0.0`, `::`) is probed over loopback of the same
/// family; any other address is probed where it listens.
pub fn health_url_for(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    // SocketAddr's Display brackets IPv6 hosts.
    format!("http://{}/health", SocketAddr::new(ip, addr.port()))
}

/// Probe `url` once. Any 2xx within `timeout` is healthy.
pub async fn probe_health(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<(), ProbeFailure> {
    match client.get(url).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => Ok(()),
        Ok(response) => Err(ProbeFailure::Status(response.status().as_u16())),
        Err(e) if e.is_timeout() => Err(ProbeFailure::Timeout),
        Err(e) => Err(ProbeFailure::Connection(e.without_url().to_string())),
    }
}

/// Probe `url` every `interval` until a probe fails or `cancel` fires.
///
/// The first probe happens one interval after start, giving the listener
/// time to come up. Returns the failure, or `None` on cancellation.
pub async fn run_watchdog(
    url: String,
    interval: Duration,
    probe_timeout: Duration,
    cancel: CancellationToken,
) -> Option<ProbeFailure> {
    let client = reqwest::Client::new();
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("watchdog stopped");
                return None;
            }
            _ = ticker.tick() => {
                match probe_health(&client, &url, probe_timeout).await {
                    Ok(()) => tracing::trace!(url = %url, "health probe ok"),
                    Err(failure) => {
                        tracing::error!(url = %url, error = %failure, "health probe failed");
                        return Some(failure);
                    }
                }
            }
        }
    }
}
