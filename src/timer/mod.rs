//! Countdown timer engine
//!
//! [`Countdown`] is the bare state machine; [`TimerEngine`] wraps it with a
//! tokio tick task, a single lock and observer delivery.

mod clock;
mod countdown;
mod engine;
mod error;
mod observer;

pub use clock::{SystemClock, WallClock};
pub use countdown::{Countdown, Notification, TimerCommand, Transition};
pub use engine::{TimerEngine, TICK_INTERVAL};
pub use error::TimerError;
pub use observer::{EventForwarder, TimerEvent, TimerObserver};
