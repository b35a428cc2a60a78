//! Wall clock used to notice time the machine spent asleep

use chrono::{DateTime, Utc};

/// Source of wall-clock time for the engine.
///
/// The monotonic clock driving the tick task stops while the machine is
/// suspended; the wall clock keeps going, so comparing the two tells the engine
/// how long it was away.
pub trait WallClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system's real-time clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
