//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::Preferences,
    state::TimerSnapshot,
    timer::Transition,
    utils::{Controls, EggStage},
};

/// Response for timer command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    pub timer: TimerSnapshot,
}

impl TimerResponse {
    /// Create a new timer response
    pub fn new(
        status: String,
        message: String,
        transition: Option<Transition>,
        timer: TimerSnapshot,
    ) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            transition,
            timer,
        }
    }

    /// Create a success response
    pub fn ok(message: String, transition: Transition, timer: TimerSnapshot) -> Self {
        Self::new("ok".to_string(), message, Some(transition), timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerSnapshot) -> Self {
        Self::new("error".to_string(), message, None, timer)
    }
}

/// Status response with everything the timer face needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub display: String,
    pub egg: EggStage,
    pub controls: Controls,
    pub preferred_minutes: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Body of PUT /preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesRequest {
    pub minutes: u64,
    /// Answer to "Reset timer with the new setting?" when a countdown is running
    #[serde(default)]
    pub reset_running: bool,
}

/// Preferences as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub status: String,
    pub message: Option<String>,
    pub minutes: u64,
    pub selected_time_secs: u64,
}

impl PreferencesResponse {
    pub fn ok(preferences: Preferences) -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
            minutes: preferences.selected_minutes(),
            selected_time_secs: preferences.selected_time_secs,
        }
    }

    pub fn error(message: String, preferences: Preferences) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            ..Self::ok(preferences)
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
