//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    services::PreferencesError,
    state::AppState,
    timer::{TimerError, Transition},
    utils::{format_remaining, Controls, EggStage},
};
use super::responses::{
    HealthResponse, PreferencesRequest, PreferencesResponse, StatusResponse, TimerResponse,
};

type TimerResult = Result<Json<TimerResponse>, (StatusCode, Json<TimerResponse>)>;
type PreferencesResult = Result<Json<PreferencesResponse>, (StatusCode, Json<PreferencesResponse>)>;

fn status_for_timer_error(err: &TimerError) -> StatusCode {
    match err {
        TimerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TimerError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TimerError::NoRuntime => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn the outcome of a timer command into a response
fn timer_reply(
    state: &AppState,
    action: &str,
    done: &str,
    result: Result<Transition, TimerError>,
) -> TimerResult {
    let timer = state.timer_snapshot();
    match result {
        Ok(transition) => {
            info!("{} endpoint called - {:?}", action, transition);
            let message = match transition {
                Transition::NoOp => format!("Timer already {}", timer.state),
                _ => done.to_string(),
            };
            Ok(Json(TimerResponse::ok(message, transition, timer)))
        }
        Err(e) => {
            warn!("{} endpoint rejected: {}", action, e);
            Err((
                status_for_timer_error(&e),
                Json(TimerResponse::error(e.to_string(), timer)),
            ))
        }
    }
}

/// Handle POST /timer/start - Start, or resume if paused
pub async fn start_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let result = state.start_timer();
    timer_reply(&state, "Start", "Timer started", result)
}

/// Handle POST /timer/pause - Pause a running timer
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let result = state.pause_timer();
    timer_reply(&state, "Pause", "Timer paused", result)
}

/// Handle POST /timer/resume - Resume a paused timer
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let result = state.resume_timer();
    timer_reply(&state, "Resume", "Timer resumed", result)
}

/// Handle POST /timer/stop - Stop and re-arm the timer
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let result = state.stop_timer();
    timer_reply(&state, "Stop", "Timer stopped", result)
}

/// Handle POST /timer/reset - Return to idle from any state
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> TimerResult {
    let result = state.reset_timer();
    timer_reply(&state, "Reset", "Timer reset", result)
}

/// Handle GET /status - Return the timer face
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.timer_snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer,
        display: format_remaining(timer.remaining_seconds),
        egg: EggStage::for_snapshot(&timer),
        controls: Controls::for_state(timer.state),
        preferred_minutes: state.preferences.get().selected_minutes(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /preferences - Return the saved timer length
pub async fn get_preferences_handler(State(state): State<Arc<AppState>>) -> Json<PreferencesResponse> {
    Json(PreferencesResponse::ok(state.preferences.get()))
}

/// Handle PUT /preferences - Save a new timer length
pub async fn put_preferences_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PreferencesRequest>,
) -> PreferencesResult {
    match state
        .update_preferences(request.minutes, request.reset_running)
        .await
    {
        Ok(preferences) => {
            info!("Preferences endpoint called - {} minutes", preferences.selected_minutes());
            Ok(Json(PreferencesResponse::ok(preferences)))
        }
        Err(e) => {
            let status = match e {
                PreferencesError::OutOfRange(_) => {
                    warn!("Rejected preferences: {}", e);
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => {
                    error!("Failed to save preferences: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            Err((
                status,
                Json(PreferencesResponse::error(e.to_string(), state.preferences.get())),
            ))
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
