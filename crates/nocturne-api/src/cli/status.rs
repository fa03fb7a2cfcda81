//! `nocturne status` - liveness from the heartbeat file.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use nocturne_infra::monitor::read_heartbeat;
use nocturne_types::config::MonitorConfig;

/// Heartbeat freshness as seen from outside the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Missing,
    Fresh { last: DateTime<Utc>, age: Duration },
    Stale { last: DateTime<Utc>, age: Duration },
}

impl Liveness {
    /// Classify a heartbeat read at `now`. Older than the watchdog interval is stale.
    pub fn classify(last: Option<DateTime<Utc>>, now: DateTime<Utc>, stale_after: Duration) -> Self {
        let Some(last) = last else {
            return Liveness::Missing;
        };
        let age = (now - last).to_std().unwrap_or(Duration::ZERO);
        if age > stale_after {
            Liveness::Stale { last, age }
        } else {
            Liveness::Fresh { last, age }
        }
    }
}

/// Print heartbeat status. Returns whether the service looks alive.
pub async fn status(monitor: &MonitorConfig, json: bool) -> Result<bool> {
    let last = read_heartbeat(&monitor.heartbeat_path).await;
    let liveness = Liveness::classify(last, Utc::now(), monitor.watchdog_interval());

    if json {
        let out = match liveness {
            Liveness::Missing => serde_json::json!({
                "heartbeat_path": monitor.heartbeat_path.display().to_string(),
                "alive": false,
            }),
            Liveness::Fresh { last, age } | Liveness::Stale { last, age } => serde_json::json!({
                "heartbeat_path": monitor.heartbeat_path.display().to_string(),
                "last_beat": last.to_rfc3339(),
                "age_secs": age.as_secs(),
                "alive": matches!(liveness, Liveness::Fresh { .. }),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(matches!(liveness, Liveness::Fresh { .. }));
    }

    println!();
    match liveness {
        Liveness::Missing => {
            println!(
                "  {} No heartbeat at {}",
                style("✗").red(),
                style(monitor.heartbeat_path.display()).dim()
            );
        }
        Liveness::Fresh { last, age } => {
            println!(
                "  {} Alive, last beat {} ({}s ago)",
                style("✓").green(),
                style(last.format("%Y-%m-%d %H:%M:%S UTC")).cyan(),
                age.as_secs()
            );
        }
        Liveness::Stale { last, age } => {
            println!(
                "  {} Stale, last beat {} ({}s ago)",
                style("✗").red(),
                style(last.format("%Y-%m-%d %H:%M:%S UTC")).yellow(),
                age.as_secs()
            );
        }
    }
    println!();

    Ok(matches!(liveness, Liveness::Fresh { .. }))
}
