//! Presentation helpers for the timer status

use serde::{Deserialize, Serialize};

use crate::state::{TimerSnapshot, TimerState};

/// Remaining time as shown on the timer face: "M:SS", or "Done!" at zero
pub fn format_remaining(remaining_seconds: u64) -> String {
    if remaining_seconds == 0 {
        return "Done!".to_string();
    }
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// How cooked the egg looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EggStage {
    Stopped,
    Raw,
    Quarter,
    Half,
    ThreeQuarter,
    Done,
}

impl EggStage {
    pub fn for_snapshot(snapshot: &TimerSnapshot) -> Self {
        match snapshot.state {
            TimerState::Idle => EggStage::Stopped,
            TimerState::Finished => EggStage::Done,
            TimerState::Running | TimerState::Paused => {
                Self::for_percent(snapshot.percent_complete())
            }
        }
    }

    fn for_percent(percent: f64) -> Self {
        match percent {
            p if p < 25.0 => EggStage::Raw,
            p if p < 50.0 => EggStage::Quarter,
            p if p < 75.0 => EggStage::Half,
            p if p < 100.0 => EggStage::ThreeQuarter,
            _ => EggStage::Done,
        }
    }
}

/// Which of the start/stop/reset controls are usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub start: bool,
    pub stop: bool,
    pub reset: bool,
}

impl Controls {
    pub fn for_state(state: TimerState) -> Self {
        match state {
            TimerState::Idle | TimerState::Finished => Self {
                start: true,
                stop: false,
                reset: false,
            },
            // start doubles as resume
            TimerState::Paused => Self {
                start: true,
                stop: false,
                reset: true,
            },
            TimerState::Running => Self {
                start: false,
                stop: true,
                reset: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(format_remaining(0), "Done!");
        assert_eq!(format_remaining(5), "0:05");
        assert_eq!(format_remaining(360), "6:00");
        assert_eq!(format_remaining(599), "9:59");
        assert_eq!(format_remaining(3725), "62:05");
    }

    #[test]
    fn egg_stage_follows_progress() {
        let at = |state, remaining| TimerSnapshot {
            state,
            duration_seconds: 100,
            remaining_seconds: remaining,
        };
        assert_eq!(EggStage::for_snapshot(&at(TimerState::Idle, 100)), EggStage::Stopped);
        assert_eq!(EggStage::for_snapshot(&at(TimerState::Running, 100)), EggStage::Raw);
        assert_eq!(EggStage::for_snapshot(&at(TimerState::Running, 75)), EggStage::Quarter);
        assert_eq!(EggStage::for_snapshot(&at(TimerState::Paused, 40)), EggStage::Half);
        assert_eq!(
            EggStage::for_snapshot(&at(TimerState::Running, 1)),
            EggStage::ThreeQuarter
        );
        assert_eq!(EggStage::for_snapshot(&at(TimerState::Finished, 0)), EggStage::Done);
    }

    #[test]
    fn controls_per_state() {
        assert_eq!(
            Controls::for_state(TimerState::Running),
            Controls { start: false, stop: true, reset: false }
        );
        assert_eq!(
            Controls::for_state(TimerState::Paused),
            Controls { start: true, stop: false, reset: true }
        );
        assert!(Controls::for_state(TimerState::Finished).start);
    }
}
