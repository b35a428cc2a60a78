//! Preference change background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Background task that applies saved preferences to the timer engine
pub async fn preference_sync_task(state: Arc<AppState>) {
    info!("Starting preference sync task");

    let mut prefs_rx = state.subscribe_preferences();

    loop {
        match prefs_rx.recv().await {
            Ok(change) => {
                debug!(
                    "Preference change received: {} minutes, reset_running={}",
                    change.preferences.selected_minutes(),
                    change.reset_running
                );

                if let Err(e) = state.apply_preferences(&change) {
                    error!("Failed to apply preference change: {}", e);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // Only the latest value matters; the next message is current.
                warn!("Preference sync lagged, skipped {} changes", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Preference channel closed, stopping preference sync task");
                break;
            }
        }
    }
}
