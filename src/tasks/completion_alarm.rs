//! Completion alarm background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::{services::Alarm, state::AppState, timer::TimerEvent, utils::format_remaining};

/// Background task that follows timer events and plays the alarm on completion
pub async fn completion_alarm_task(state: Arc<AppState>, alarm: Alarm) {
    info!(
        "Starting completion alarm task (sound {})",
        if alarm.is_enabled() { "enabled" } else { "disabled" }
    );

    let mut events_rx = state.subscribe_events();

    loop {
        match events_rx.recv().await {
            Ok(TimerEvent::Tick { remaining_seconds, .. }) => {
                debug!("Timer: {}", format_remaining(remaining_seconds));
            }
            Ok(TimerEvent::Finished { .. }) => {
                info!("Egg is ready");
                if !alarm.is_enabled() {
                    continue;
                }
                // Play off the event loop so later events are not held up.
                let alarm = alarm.clone();
                tokio::spawn(async move {
                    if let Err(e) = alarm.play().await {
                        error!("Failed to play completion sound: {}", e);
                    }
                });
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Completion alarm lagged, skipped {} timer events", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Timer event channel closed, stopping completion alarm task");
                break;
            }
        }
    }
}
