//! Timer state structure and management

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl TimerState {
    /// Check if the periodic tick should be active in this state
    pub fn is_ticking(&self) -> bool {
        matches!(self, TimerState::Running)
    }

    /// Check if the duration may be changed in this state
    pub fn accepts_duration_change(&self) -> bool {
        matches!(self, TimerState::Idle | TimerState::Finished)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Point-in-time copy of the engine, published after every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
}

impl TimerSnapshot {
    /// Snapshot of a freshly armed, idle timer
    pub fn idle(duration_seconds: u64) -> Self {
        Self {
            state: TimerState::Idle,
            duration_seconds,
            remaining_seconds: duration_seconds,
        }
    }

    /// Check if the countdown is currently ticking
    pub fn is_active(&self) -> bool {
        self.state.is_ticking()
    }

    /// Percentage of the countdown already elapsed, 0.0 ..= 100.0
    pub fn percent_complete(&self) -> f64 {
        if self.duration_seconds == 0 {
            return 100.0;
        }
        let elapsed = self.duration_seconds.saturating_sub(self.remaining_seconds);
        (elapsed as f64 / self.duration_seconds as f64 * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_is_full() {
        let snapshot = TimerSnapshot::idle(360);
        assert_eq!(snapshot.state, TimerState::Idle);
        assert_eq!(snapshot.remaining_seconds, 360);
        assert!(!snapshot.is_active());
        assert_eq!(snapshot.percent_complete(), 0.0);
    }

    #[test]
    fn percent_complete_tracks_remaining() {
        let snapshot = TimerSnapshot {
            state: TimerState::Running,
            duration_seconds: 200,
            remaining_seconds: 50,
        };
        assert_eq!(snapshot.percent_complete(), 75.0);
    }

    #[test]
    fn only_idle_and_finished_accept_duration_change() {
        assert!(TimerState::Idle.accepts_duration_change());
        assert!(TimerState::Finished.accepts_duration_change());
        assert!(!TimerState::Running.accepts_duration_change());
        assert!(!TimerState::Paused.accepts_duration_change());
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&TimerState::Finished).unwrap();
        assert_eq!(json, "\"finished\"");
    }
}
