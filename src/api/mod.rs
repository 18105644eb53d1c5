// src/api/mod.rs

//! HTTP control surface.
//!
//! Routes:
//! - `GET  /status`   game server status via the status probe
//! - `GET  /system`   host telemetry
//! - `GET  /tps`      simulated ticks-per-second
//! - `GET  /console`  console buffer snapshot (text/plain)
//! - `GET  /plugins`  installed plugin jars
//! - `POST /control`  `{"action": "start" | "stop" | "restart"}`
//! - `POST /command`  `{"command": "<line>"}`

pub mod handlers;
pub mod plugins;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::command::CommandChannel;
use crate::console::ConsoleBuffer;
use crate::probe::{MetricsProvider, StatusProbe};
use crate::supervisor::SupervisorHandle;

/// Shared application state for API handlers.
pub struct AppState {
    pub supervisor: SupervisorHandle,
    pub commands: CommandChannel,
    pub console: ConsoleBuffer,
    pub status: Arc<dyn StatusProbe>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub plugins_dir: PathBuf,
    /// Control service start, reported as `uptime` by `/status`.
    pub started_at: Instant,
    /// `$JAVA_HOME` captured at startup.
    pub java_home: Option<String>,
}

impl AppState {
    pub fn new(
        supervisor: SupervisorHandle,
        console: ConsoleBuffer,
        status: Arc<dyn StatusProbe>,
        metrics: Arc<dyn MetricsProvider>,
        plugins_dir: PathBuf,
    ) -> Self {
        Self {
            commands: CommandChannel::new(supervisor.clone()),
            supervisor,
            console,
            status,
            metrics,
            plugins_dir,
            started_at: Instant::now(),
            java_home: std::env::var("JAVA_HOME").ok(),
        }
    }
}

/// Build the Axum router with all API routes and permissive CORS.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/system", get(handlers::system))
        .route("/tps", get(handlers::tps))
        .route("/console", get(handlers::console))
        .route("/plugins", get(handlers::plugins))
        .route("/control", post(handlers::control))
        .route("/command", post(handlers::command))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
