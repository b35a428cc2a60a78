//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    services::{PreferenceStore, Preferences, PreferencesChanged, PreferencesError},
    timer::{EventForwarder, TimerEngine, TimerError, TimerEvent, Transition},
};
use super::TimerSnapshot;

/// Capacity of the timer event and preference change channels
const CHANNEL_CAPACITY: usize = 100;

/// Application state shared by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// The countdown itself
    pub engine: TimerEngine,
    /// Persisted timer length
    pub preferences: PreferenceStore,
    /// Registered as the engine's observer; owned here so it outlives the engine's weak handle
    pub events: Arc<EventForwarder>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Channel announcing saved preferences to every listener
    pub prefs_change_tx: broadcast::Sender<PreferencesChanged>,
}

impl AppState {
    /// Wire the engine to a fresh event forwarder
    pub fn new(engine: TimerEngine, preferences: PreferenceStore, port: u16, host: String) -> Self {
        let (prefs_change_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let events = Arc::new(EventForwarder::new(CHANNEL_CAPACITY));
        engine.observe(&events);

        Self {
            engine,
            preferences,
            events,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            prefs_change_tx,
        }
    }

    /// Subscribe to tick and completion events
    pub fn subscribe_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Subscribe to saved preference changes
    pub fn subscribe_preferences(&self) -> broadcast::Receiver<PreferencesChanged> {
        self.prefs_change_tx.subscribe()
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Start button: resume a paused timer, otherwise arm it with the preferred length
    pub fn start_timer(&self) -> Result<Transition, TimerError> {
        let transition = self
            .engine
            .start_with(self.preferences.get().selected_time_secs)?;
        self.record_action("start");
        Ok(transition)
    }

    pub fn pause_timer(&self) -> Result<Transition, TimerError> {
        let transition = self.engine.pause()?;
        self.record_action("pause");
        Ok(transition)
    }

    pub fn resume_timer(&self) -> Result<Transition, TimerError> {
        let transition = self.engine.resume()?;
        self.record_action("resume");
        Ok(transition)
    }

    pub fn stop_timer(&self) -> Result<Transition, TimerError> {
        let transition = self.engine.stop()?;
        self.record_action("stop");
        Ok(transition)
    }

    pub fn reset_timer(&self) -> Result<Transition, TimerError> {
        let transition = self.engine.reset()?;
        self.record_action("reset");
        Ok(transition)
    }

    /// Save a new timer length and announce it
    pub async fn update_preferences(
        &self,
        minutes: u64,
        reset_running: bool,
    ) -> Result<Preferences, PreferencesError> {
        let preferences = Preferences::from_minutes(minutes)?;
        self.preferences.save(preferences).await?;
        self.record_action("preferences");

        // Notify preference listeners (this will update the engine)
        let change = PreferencesChanged {
            preferences,
            reset_running,
        };
        if let Err(e) = self.prefs_change_tx.send(change) {
            warn!("Failed to send preference change notification: {}", e);
        }

        Ok(preferences)
    }

    /// Bring the engine in line with changed preferences.
    ///
    /// A running countdown is only interrupted when the change asks for it;
    /// otherwise the new length takes effect on the next start.
    pub fn apply_preferences(&self, change: &PreferencesChanged) -> Result<Transition, TimerError> {
        let transition = self
            .engine
            .reconfigure(change.preferences.selected_time_secs, change.reset_running)?;
        if transition == Transition::Applied {
            info!(
                "Timer reset to {} minutes after preference change",
                change.preferences.selected_minutes()
            );
        } else {
            debug!("Preference change left the timer as it was");
        }
        Ok(transition)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
