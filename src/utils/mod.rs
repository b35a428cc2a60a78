//! Utility functions module
//!
//! Display formatting for the timer face and signal handling.

pub mod display;
pub mod signals;

// Re-export main functions
pub use display::{format_remaining, Controls, EggStage};
pub use signals::shutdown_signal;
