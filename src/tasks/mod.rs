//! Background tasks module
//!
//! Tasks that run alongside the HTTP server and react to timer and preference events.

pub mod completion_alarm;
pub mod preference_sync;

// Re-export main functions
pub use completion_alarm::completion_alarm_task;
pub use preference_sync::preference_sync_task;
