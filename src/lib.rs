// src/lib.rs

pub mod api;
pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod errors;
pub mod logging;
pub mod probe;
pub mod supervisor;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::api::{AppState, build_router};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::console::{ConsoleBuffer, spawn_trim_task};
use crate::probe::{SlpProbe, SysinfoProvider};
use crate::supervisor::{SupervisorHandle, TokioLauncher, spawn_supervisor};
use crate::types::StartOutcome;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - console buffer and its trim task
/// - the supervisor owner task with the real process launcher
/// - status probe and telemetry provider
/// - the HTTP router
/// - Ctrl-C handling, which stops the managed server before returning
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let mut cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(port) = args.port {
        cfg.http.port = port;
    }
    if args.autostart {
        cfg.autostart = true;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let console = ConsoleBuffer::new(cfg.console.capacity);
    let _trim_handle = spawn_trim_task(console.clone(), cfg.console.trim_interval);

    let supervisor = spawn_supervisor(
        Arc::new(TokioLauncher),
        cfg.launch.clone(),
        console.clone(),
        cfg.supervisor.clone(),
    );

    if cfg.autostart {
        match supervisor.start().await {
            Ok(StartOutcome::Started { pid }) => info!(?pid, "autostarted server"),
            Ok(StartOutcome::AlreadyActive(state)) => debug!(%state, "autostart skipped"),
            Err(e) => warn!(error = %e, "autostart failed"),
        }
    }

    let state = Arc::new(AppState::new(
        supervisor.clone(),
        console,
        Arc::new(SlpProbe::new(cfg.status.clone())),
        Arc::new(SysinfoProvider::new(cfg.telemetry_timeout)),
        cfg.plugins_dir.clone(),
    ));
    let app = build_router(state);

    let addr = cfg.http.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind control API on {addr}"))?;
    info!(%addr, "control API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    stop_managed_server(&supervisor, cfg.shutdown_timeout).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received; shutting down");
}

/// Ask the managed server to stop and wait (bounded) for its exit. A process
/// that outlives the wait is killed when the runtime drops its handle.
async fn stop_managed_server(supervisor: &SupervisorHandle, limit: Duration) {
    if !supervisor.is_running() {
        return;
    }

    info!(timeout = ?limit, "stopping managed server before exit");
    match timeout(limit, supervisor.stop_and_wait()).await {
        Ok(Ok(code)) => info!(?code, "managed server exited"),
        Ok(Err(e)) => warn!(error = %e, "failed to stop managed server"),
        Err(_) => warn!(timeout = ?limit, "managed server did not exit in time; killing it"),
    }
}

/// Dry-run output: resolved launch command and endpoints.
fn print_dry_run(cfg: &ConfigFile) {
    println!("gamectl dry-run");
    println!("  launch: {}", cfg.launch.display_command());
    println!("  working dir: {}", cfg.launch.working_dir.display());
    println!("  stop command: {}", cfg.supervisor.stop_command);
    println!("  autostart: {}", cfg.autostart);
    println!();
    println!("  http: {}", cfg.http.addr());
    println!(
        "  status probe: {}:{} (timeout {:?})",
        cfg.status.host, cfg.status.port, cfg.status.timeout
    );
    println!("  plugins dir: {}", cfg.plugins_dir.display());
    println!(
        "  console: {} chars, trim every {:?}",
        cfg.console.capacity, cfg.console.trim_interval
    );

    debug!("dry-run complete (nothing started)");
}
