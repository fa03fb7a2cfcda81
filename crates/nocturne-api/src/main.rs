//! Nocturne CLI and webhook server entry point.
//!
//! Binary name: `nocturne`
//!
//! Loads `nocturne.toml` from the data directory, applies command-line
//! overrides, then either serves the webhook receiver or runs a one-shot
//! command.

mod cli;
mod http;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use nocturne_infra::config::{load_config, resolve_data_dir};
use nocturne_infra::monitor::{self, ProbeFailure};
use nocturne_observe::tracing_setup::{init_tracing, shutdown_tracing};
use nocturne_types::config::NocturneConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,nocturne=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "nocturne", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let mut config = load_config(&data_dir).await;

    let result = run(cli, &mut config).await;
    shutdown_tracing();

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => Err(e),
    }
}

/// Run the selected command. `Ok(false)` means "completed, but exit non-zero".
async fn run(cli: Cli, config: &mut NocturneConfig) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Serve {
            port,
            host,
            no_monitor,
            overrides,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if no_monitor {
                config.monitor.enabled = false;
            }
            let notify_token = overrides.apply(config);
            serve(config, notify_token).await?;
            Ok(true)
        }

        Commands::Trigger { id, overrides } => {
            let notify_token = overrides.apply(config);
            cli::trigger::trigger(config, notify_token, id, cli.json).await
        }

        Commands::Status => cli::status::status(&config.monitor, cli.json).await,

        Commands::Sign {
            timestamp,
            body,
            body_file,
            creds,
        } => {
            let creds = creds.unwrap_or_else(|| config.credentials_path.clone());
            cli::sign::sign(creds, &timestamp, body, body_file, cli.json).await?;
            Ok(true)
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

/// Serve `/health` and `/webhook` until Ctrl+C or SIGTERM.
async fn serve(
    config: &mut NocturneConfig,
    notify_token: Option<secrecy::SecretString>,
) -> anyhow::Result<()> {
    let dispatcher = state::build_dispatcher(config, notify_token)?;
    let state = AppState::new(config, Arc::new(dispatcher));

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        addr = %addr,
        mode = %config.task.mode,
        credentials = %config.credentials_path.display(),
        "webhook receiver listening"
    );
    println!(
        "  {} Nocturne listening on {}",
        console::style("🌙").bold(),
        console::style(format!("http://{addr}")).cyan()
    );

    let cancel = CancellationToken::new();
    if config.monitor.enabled {
        start_monitor(config, monitor::health_url_for(local_addr), cancel.clone());
    } else {
        tracing::info!("heartbeat and watchdog disabled");
    }

    let router = http::router::build_router(state, config.server.body_limit_bytes);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    tracing::info!("server stopped");
    Ok(())
}

/// Spawn the heartbeat writer and the health watchdog probing `health_url`.
///
/// A failed probe exits the process with status 1.
fn start_monitor(config: &NocturneConfig, health_url: String, cancel: CancellationToken) {
    let monitor_config = &config.monitor;
    tokio::spawn(monitor::run_heartbeat(
        monitor_config.heartbeat_path.clone(),
        monitor_config.heartbeat_interval(),
        cancel.clone(),
    ));

    let interval = monitor_config.watchdog_interval();
    let probe_timeout = monitor_config.probe_timeout();
    tokio::spawn(async move {
        let outcome = monitor::run_watchdog(health_url, interval, probe_timeout, cancel).await;
        if let Some(code) = watchdog_exit_code(outcome.as_ref()) {
            shutdown_tracing();
            std::process::exit(code);
        }
    });
}

/// Exit code once the watchdog has stopped. `None` means it was cancelled
/// and the process should keep shutting down normally.
fn watchdog_exit_code(outcome: Option<&ProbeFailure>) -> Option<i32> {
    let failure = outcome?;
    tracing::error!(error = %failure, "watchdog: service unhealthy, exiting for restart");
    Some(1)
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
