//! Egg Timer - A countdown timer engine with an HTTP control surface
//!
//! The core is [`timer::TimerEngine`], a start/pause/resume/stop/reset state
//! machine that ticks once a second and notifies an observer. The remaining
//! modules wrap it into a small headless application: persisted preferences,
//! a completion alarm and HTTP endpoints.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, TimerSnapshot, TimerState};
pub use timer::{TimerEngine, TimerError, TimerObserver, Transition};
pub use utils::signals::shutdown_signal;
