//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::state::AppState;
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Request body for POST /goal. The value may be a number or the raw text
/// of an input field; both go through the same lenient parser.
#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    #[serde(default)]
    pub minutes: Option<Value>,
}

fn snapshot_or_500(state: &AppState) -> Result<crate::state::TimerSnapshot, StatusCode> {
    state.snapshot().map_err(|e| {
        error!("Failed to compute timer snapshot: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle POST /start - Start or resume the timer
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.start() {
        Ok(started) => {
            let message = if started {
                "Timer started"
            } else {
                "Timer already running"
            };
            info!("Start endpoint called - {}", message.to_lowercase());
            let timer = snapshot_or_500(&state)?;
            Ok(Json(ApiResponse::running(message.to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to start timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /pause - Pause the timer and check for a new best
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.pause() {
        Ok(folded) => {
            let message = if folded.is_some() {
                "Timer paused"
            } else {
                "Timer not running"
            };
            info!("Pause endpoint called - {}", message.to_lowercase());
            let timer = snapshot_or_500(&state)?;
            Ok(Json(ApiResponse::paused(message.to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to pause timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /reset - Zero the timer without touching the best time
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset() {
        Ok(()) => {
            info!("Reset endpoint called - timer zeroed");
            let timer = snapshot_or_500(&state)?;
            Ok(Json(ApiResponse::idle("Timer reset".to_string(), timer)))
        }
        Err(e) => {
            error!("Failed to reset timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /goal - Set the goal in minutes
pub async fn goal_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoalRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let raw = match &payload.minutes {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };

    let minutes = state.set_goal(&raw);
    info!("Goal endpoint called - effective goal {}min", minutes);
    let timer = snapshot_or_500(&state)?;
    Ok(Json(ApiResponse::from_snapshot(
        format!("Goal set to {} minutes", minutes),
        timer,
    )))
}

/// Handle GET /status - Return the timer snapshot plus server metadata
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = snapshot_or_500(&state)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        confetti: state.confetti.particles(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
