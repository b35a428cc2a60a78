//! Error types for the countdown engine.

use thiserror::Error;

use super::countdown::TimerCommand;
use crate::state::TimerState;

/// Errors returned by [`TimerEngine`](super::TimerEngine) operations.
///
/// All variants are local and recoverable: the engine is left in the state it
/// was in before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Bad duration, or a duration change outside Idle/Finished
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The command has no edge from the current state
    #[error("Cannot {command} a timer that is {from}")]
    InvalidTransition {
        from: TimerState,
        command: TimerCommand,
    },

    /// The engine was built outside a tokio runtime
    #[error("No tokio runtime available to drive the timer")]
    NoRuntime,
}

impl TimerError {
    pub(crate) fn zero_duration() -> Self {
        TimerError::InvalidConfiguration("duration must be greater than zero".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_state_and_command() {
        let err = TimerError::InvalidTransition {
            from: TimerState::Idle,
            command: TimerCommand::Pause,
        };
        assert_eq!(err.to_string(), "Cannot pause a timer that is idle");
    }
}
