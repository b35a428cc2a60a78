//! Countdown state machine.
//!
//! `Countdown` holds no clock and no task: it only knows the duration, the
//! seconds left, and which commands are legal from each state. The engine in
//! [`super::engine`] feeds it elapsed intervals and turns its notifications into
//! observer callbacks.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//!   ^                |  \                |
//!   |                |   `--tick to 0--> Finished --start--> Running
//!   `---stop/reset---'--------stop/reset-'--reset--'
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::TimerError;
use crate::state::{TimerSnapshot, TimerState};

/// User-triggered transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

impl fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Resume => "resume",
            TimerCommand::Stop => "stop",
            TimerCommand::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// State changed
    Applied,
    /// Command was legal but there was nothing to change
    NoOp,
    /// Issued from inside an observer callback; runs once delivery completes
    Deferred,
}

/// Something the observer has to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Tick(u64),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration: u64,
    remaining: u64,
    state: TimerState,
}

impl Countdown {
    pub fn new(duration: u64) -> Result<Self, TimerError> {
        if duration == 0 {
            return Err(TimerError::zero_duration());
        }
        Ok(Self {
            duration,
            remaining: duration,
            state: TimerState::Idle,
        })
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            duration_seconds: self.duration,
            remaining_seconds: self.remaining,
        }
    }

    /// Apply a user command. Illegal commands leave everything untouched.
    pub fn apply(&mut self, command: TimerCommand) -> Result<Transition, TimerError> {
        use TimerCommand::*;
        use TimerState::*;

        match (self.state, command) {
            (Idle | Finished, Start) => {
                self.remaining = self.duration;
                self.state = Running;
                Ok(Transition::Applied)
            }
            (Running, Pause) => {
                self.state = Paused;
                Ok(Transition::Applied)
            }
            (Paused, Resume) => {
                self.state = Running;
                Ok(Transition::Applied)
            }
            (Running | Paused, Stop) | (Running | Paused | Finished, Reset) => {
                self.remaining = self.duration;
                self.state = Idle;
                Ok(Transition::Applied)
            }
            (Paused, Pause) | (Running, Resume) | (Idle, Reset) => Ok(Transition::NoOp),
            (from, command) => Err(TimerError::InvalidTransition { from, command }),
        }
    }

    /// Change the configured duration. Only legal while Idle or Finished.
    pub fn set_duration(&mut self, duration: u64) -> Result<(), TimerError> {
        if duration == 0 {
            return Err(TimerError::zero_duration());
        }
        if !self.state.accepts_duration_change() {
            return Err(TimerError::InvalidConfiguration(format!(
                "duration cannot change while the timer is {}",
                self.state
            )));
        }
        self.duration = duration;
        if self.state == TimerState::Idle {
            self.remaining = duration;
        }
        Ok(())
    }

    /// Account for `intervals` elapsed ticks while running.
    ///
    /// Several intervals collapse into a single progress notification. The
    /// completion notification is emitted on the tick that reaches zero and
    /// never again for the same run.
    pub fn elapse(&mut self, intervals: u64) -> Vec<Notification> {
        if self.state != TimerState::Running || intervals == 0 {
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(intervals);
        let mut notifications = vec![Notification::Tick(self.remaining)];
        if self.remaining == 0 {
            self.state = TimerState::Finished;
            notifications.push(Notification::Finished);
        }
        notifications
    }
}
