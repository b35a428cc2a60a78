//! Observer contract and a channel adapter for async consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Receives progress and completion notifications from a running timer.
///
/// Callbacks run synchronously on the task that drives the tick, with the
/// engine's state lock held. Implementations must return quickly. Mutating
/// engine calls made from a callback are queued and applied after it returns.
pub trait TimerObserver: Send + Sync {
    fn on_tick(&self, remaining_seconds: u64);

    fn on_finished(&self);
}

/// Timer notification as a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Tick {
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    Finished {
        at: DateTime<Utc>,
    },
}

/// Observer that republishes every callback on a broadcast channel
#[derive(Debug, Clone)]
pub struct EventForwarder {
    tx: broadcast::Sender<TimerEvent>,
}

impl EventForwarder {
    /// Create a forwarder with its own channel of the given capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: TimerEvent) {
        // No subscribers is fine; the event is simply dropped.
        if self.tx.send(event).is_err() {
            debug!("Timer event dropped, no subscribers");
        }
    }
}

impl TimerObserver for EventForwarder {
    fn on_tick(&self, remaining_seconds: u64) {
        self.publish(TimerEvent::Tick {
            remaining_seconds,
            at: Utc::now(),
        });
    }

    fn on_finished(&self) {
        self.publish(TimerEvent::Finished { at: Utc::now() });
    }
}
