// src/api/handlers.rs

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::api::plugins::list_plugins;
use crate::errors::CommandError;
use crate::types::ControlAction;

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.status.query().await {
        Ok(s) => Json(json!({
            "online": true,
            "motd": s.motd,
            "players": s.players_online,
            "maxPlayers": s.players_max,
            "latency": s.latency_ms,
            "version": s.version,
            "uptime": format!("{}s", state.started_at.elapsed().as_secs()),
            "java": state.java_home.as_deref().unwrap_or("Java Unknown"),
            "playerSample": s.player_sample,
        })),
        Err(e) => {
            debug!(error = %e, "status probe failed");
            Json(json!({ "online": false }))
        }
    }
}

pub async fn system(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.sample().await)
}

/// Simulated; not derived from the server.
pub async fn tps() -> Json<Value> {
    let tps: u32 = rand::rng().random_range(18..=19);
    Json(json!({ "tps": tps }))
}

pub async fn console(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.console.snapshot_or_placeholder(),
    )
}

pub async fn plugins(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(list_plugins(&state.plugins_dir))
}

pub async fn control(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let action = body
        .ok()
        .and_then(|Json(v)| v.get("action").and_then(Value::as_str).map(str::to_string))
        .and_then(|a| a.parse::<ControlAction>().ok());

    let Some(action) = action else {
        return (StatusCode::BAD_REQUEST, "Invalid action").into_response();
    };

    info!(?action, "control request");
    let result = match action {
        ControlAction::Start => state.supervisor.start().await.map(|_| ()),
        ControlAction::Stop => state.supervisor.stop().await.map(|_| ()),
        ControlAction::Restart => state.supervisor.restart().await.map(|_| ()),
    };

    match result {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            warn!(?action, error = %e, "control action failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let command = body
        .ok()
        .and_then(|Json(v)| v.get("command").and_then(Value::as_str).map(str::to_string))
        .filter(|c| !c.trim().is_empty());

    let Some(command) = command else {
        return (StatusCode::BAD_REQUEST, "Missing command").into_response();
    };

    match state.commands.send(&command).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(CommandError::NotRunning) => {
            (StatusCode::BAD_REQUEST, "Server not running").into_response()
        }
        Err(CommandError::Invalid(reason)) => {
            (StatusCode::BAD_REQUEST, format!("Invalid command: {reason}")).into_response()
        }
        Err(CommandError::WriteFailure(reason)) => {
            warn!(error = %reason, "command write failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send command").into_response()
        }
    }
}
