//! External collaborators of the timer
//!
//! Preference persistence and completion sound playback. Neither is used by
//! the engine itself; the application wires them around it.

pub mod alarm;
pub mod preferences;

// Re-export main types
pub use alarm::{Alarm, AlarmError};
pub use preferences::{
    PreferenceStore, Preferences, PreferencesChanged, PreferencesError,
    DEFAULT_SELECTED_TIME_SECS,
};
