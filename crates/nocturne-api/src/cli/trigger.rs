//! `nocturne trigger` - start an exploration by hand.
//!
//! Goes through the same dispatcher as the webhook. In supervised mode the
//! command stays in the foreground until the session settles.

use anyhow::Result;
use chrono::Utc;
use console::style;
use nocturne_core::dispatch::policy::manual_trigger_id;
use nocturne_types::config::NocturneConfig;
use nocturne_types::session::{SessionState, SupervisionMode};
use secrecy::SecretString;

use crate::state::build_dispatcher;

/// Run one exploration. Returns whether it ended well.
///
/// Detached runs succeed once the process is started; supervised runs
/// succeed when the process exits 0.
pub async fn trigger(
    config: &NocturneConfig,
    notify_token: Option<SecretString>,
    id: Option<String>,
    json: bool,
) -> Result<bool> {
    let trigger_id = id.unwrap_or_else(|| manual_trigger_id(Utc::now()));
    let dispatcher = build_dispatcher(config, notify_token)?;

    let mut session = dispatcher.trigger(&trigger_id).await;
    let state = match session.mode {
        SupervisionMode::Detached => session.state(),
        SupervisionMode::Supervised => {
            if !json && session.state() == SessionState::Running {
                println!(
                    "  {} Exploration {} running, waiting for it to finish...",
                    style("🌙").bold(),
                    style(&trigger_id).cyan()
                );
            }
            session.settled().await
        }
    };

    let ok = match session.mode {
        SupervisionMode::Detached => state == SessionState::Running,
        SupervisionMode::Supervised => {
            matches!(state, SessionState::Completed | SessionState::Notified)
        }
    };

    if json {
        let out = serde_json::json!({
            "session_id": session.id.to_string(),
            "trigger_id": trigger_id,
            "mode": session.mode.to_string(),
            "state": state.to_string(),
            "summary_path": session.summary_path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let mark = if ok {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  {} {} ({})",
            mark,
            style(&trigger_id).cyan(),
            style(state).bold()
        );
        println!(
            "  {}",
            style(format!("summary: {}", session.summary_path.display())).dim()
        );
    }

    Ok(ok)
}
