//! State management module
//!
//! The timer's state types and the application state shared by handlers and tasks.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_state::{TimerSnapshot, TimerState};
