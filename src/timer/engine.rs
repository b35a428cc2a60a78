//! Countdown engine driven by a tokio tick task.
//!
//! All reads and writes of the countdown go through one mutex. Every running
//! period gets a fresh generation number and its own tick task; pausing,
//! stopping, resetting or dropping the engine bumps the generation under the
//! lock, so a tick of an old period that wakes late finds a stale generation
//! and delivers nothing.
//!
//! Elapsed time is measured from the period's anchor rather than by counting
//! wake-ups, so a late wake-up collapses several intervals into one delivered
//! tick. The anchor is kept on both the monotonic clock and the wall clock:
//! the monotonic one drives scheduling, the wall one catches up on time the
//! machine spent suspended. Progress toward the next tick survives a pause.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak},
    thread::{self, ThreadId},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use super::{
    clock::{SystemClock, WallClock},
    countdown::{Countdown, Notification, TimerCommand, Transition},
    error::TimerError,
    observer::TimerObserver,
};
use crate::state::{TimerSnapshot, TimerState};

/// Scheduling granularity of the countdown
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Operation queued by an observer callback
#[derive(Debug, Clone, Copy)]
enum DeferredOp {
    Command(TimerCommand),
    SetDuration(u64),
    StartWith(u64),
    Reconfigure { duration: u64, interrupt_running: bool },
}

/// Timing of one running period
#[derive(Debug, Clone, Copy)]
struct Period {
    anchor: Instant,
    wall_anchor: DateTime<Utc>,
    /// Intervals already delivered
    consumed: u64,
}

impl Period {
    /// A period that already has `carried` progress toward its first tick
    fn begin(now: Instant, wall_now: DateTime<Utc>, carried: Duration) -> Self {
        let anchor = now.checked_sub(carried).unwrap_or(now);
        let wall_anchor = chrono::Duration::from_std(carried)
            .ok()
            .and_then(|carried| wall_now.checked_sub_signed(carried))
            .unwrap_or(wall_now);
        Self {
            anchor,
            wall_anchor,
            consumed: 0,
        }
    }

    fn elapsed(&self, now: Instant, wall_now: DateTime<Utc>) -> Duration {
        let monotonic = now.saturating_duration_since(self.anchor);
        let wall = (wall_now - self.wall_anchor).to_std().unwrap_or_default();
        // Monotonic time stands still while the machine sleeps. A wall clock
        // more than an interval ahead means it did.
        if wall > monotonic + TICK_INTERVAL {
            wall
        } else {
            monotonic
        }
    }

    fn due(&self, elapsed: Duration) -> u64 {
        let due = u64::try_from(elapsed.as_nanos() / TICK_INTERVAL.as_nanos()).unwrap_or(u64::MAX);
        due.max(self.consumed)
    }

    /// Progress made toward the next undelivered tick, always under one interval
    fn progress(&self, elapsed: Duration) -> Duration {
        elapsed
            .saturating_sub(interval_offset(self.consumed))
            .min(TICK_INTERVAL.saturating_sub(Duration::from_nanos(1)))
    }
}

struct Inner {
    countdown: Countdown,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    period: Option<Period>,
    /// Progress toward the next tick made before the last pause
    carried: Duration,
}

struct Shared {
    inner: Mutex<Inner>,
    observer: RwLock<Option<Weak<dyn TimerObserver>>>,
    /// Thread currently running observer callbacks, if any
    delivering: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<DeferredOp>>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    clock: Arc<dyn WallClock>,
    runtime: Handle,
}

/// Countdown timer with start/pause/resume/stop/reset transitions
pub struct TimerEngine {
    shared: Arc<Shared>,
}

impl TimerEngine {
    /// Create an idle engine on the current tokio runtime
    pub fn new(duration_seconds: u64) -> Result<Self, TimerError> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        Self::with_handle(duration_seconds, runtime)
    }

    /// Create an idle engine whose tick tasks run on `runtime`
    pub fn with_handle(duration_seconds: u64, runtime: Handle) -> Result<Self, TimerError> {
        Self::with_clock(duration_seconds, runtime, Arc::new(SystemClock))
    }

    /// Create an idle engine that reads wall time from `clock`
    pub fn with_clock(
        duration_seconds: u64,
        runtime: Handle,
        clock: Arc<dyn WallClock>,
    ) -> Result<Self, TimerError> {
        let countdown = Countdown::new(duration_seconds)?;
        let (snapshot_tx, _) = watch::channel(countdown.snapshot());

        debug!("Timer engine created with duration {}s", duration_seconds);

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    countdown,
                    generation: 0,
                    ticker: None,
                    period: None,
                    carried: Duration::ZERO,
                }),
                observer: RwLock::new(None),
                delivering: Mutex::new(None),
                deferred: Mutex::new(VecDeque::new()),
                snapshot_tx,
                clock,
                runtime,
            }),
        })
    }

    pub fn start(&self) -> Result<Transition, TimerError> {
        self.command(TimerCommand::Start)
    }

    pub fn pause(&self) -> Result<Transition, TimerError> {
        self.command(TimerCommand::Pause)
    }

    pub fn resume(&self) -> Result<Transition, TimerError> {
        self.command(TimerCommand::Resume)
    }

    pub fn stop(&self) -> Result<Transition, TimerError> {
        self.command(TimerCommand::Stop)
    }

    pub fn reset(&self) -> Result<Transition, TimerError> {
        self.command(TimerCommand::Reset)
    }

    /// Apply any user command
    pub fn command(&self, command: TimerCommand) -> Result<Transition, TimerError> {
        self.run(DeferredOp::Command(command))
    }

    /// Change the countdown length. Rejected while Running or Paused.
    pub fn set_duration(&self, duration_seconds: u64) -> Result<Transition, TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::zero_duration());
        }
        self.run(DeferredOp::SetDuration(duration_seconds))
    }

    /// Resume a paused countdown, or start a fresh one of `duration_seconds`.
    ///
    /// The state check, the duration change and the start happen under one
    /// lock. A running timer yields `InvalidTransition`.
    pub fn start_with(&self, duration_seconds: u64) -> Result<Transition, TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::zero_duration());
        }
        self.run(DeferredOp::StartWith(duration_seconds))
    }

    /// Reset to Idle with a new length, all under one lock.
    ///
    /// A running countdown is left alone (`NoOp`) unless `interrupt_running`
    /// is set.
    pub fn reconfigure(
        &self,
        duration_seconds: u64,
        interrupt_running: bool,
    ) -> Result<Transition, TimerError> {
        if duration_seconds == 0 {
            return Err(TimerError::zero_duration());
        }
        self.run(DeferredOp::Reconfigure {
            duration: duration_seconds,
            interrupt_running,
        })
    }

    fn run(&self, op: DeferredOp) -> Result<Transition, TimerError> {
        if self.shared.is_delivering_here() {
            debug!("Deferring re-entrant {:?} until delivery completes", op);
            self.shared.defer(op);
            return Ok(Transition::Deferred);
        }

        let mut inner = self.shared.lock_inner();
        self.shared.execute(&mut inner, op)
    }

    /// Register the observer, replacing any previous one. `None` detaches.
    ///
    /// Only a weak reference is kept; an observer that has been dropped is
    /// skipped silently.
    pub fn set_observer(&self, observer: Option<Weak<dyn TimerObserver>>) {
        let mut slot = self
            .shared
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(
            "Timer observer {}",
            if observer.is_some() { "attached" } else { "detached" }
        );
        *slot = observer;
    }

    /// Register `observer` without handing over ownership
    pub fn observe<O: TimerObserver + 'static>(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn TimerObserver> = weak;
        self.set_observer(Some(weak));
    }

    pub fn detach_observer(&self) {
        self.set_observer(None);
    }

    pub fn current_state(&self) -> TimerState {
        self.snapshot().state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.snapshot().remaining_seconds
    }

    pub fn duration_seconds(&self) -> u64 {
        self.snapshot().duration_seconds
    }

    /// Latest published state. Safe to call from an observer callback.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.shared.snapshot_tx.borrow()
    }

    /// Watch every published change
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        let mut inner = self.shared.lock_inner();
        self.shared.disarm(&mut inner);
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl Shared {
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_delivering_here(&self) -> bool {
        let delivering = self.delivering.lock().unwrap_or_else(PoisonError::into_inner);
        *delivering == Some(thread::current().id())
    }

    fn defer(&self, op: DeferredOp) {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(op);
    }

    fn observer(&self) -> Option<Arc<dyn TimerObserver>> {
        self.observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(inner.countdown.snapshot());
    }

    fn execute(self: &Arc<Self>, inner: &mut Inner, op: DeferredOp) -> Result<Transition, TimerError> {
        match op {
            DeferredOp::Command(command) => self.apply(inner, command),
            DeferredOp::SetDuration(duration) => self.set_duration(inner, duration),
            DeferredOp::StartWith(duration) => self.start_with(inner, duration),
            DeferredOp::Reconfigure {
                duration,
                interrupt_running,
            } => self.reconfigure(inner, duration, interrupt_running),
        }
    }

    fn apply(
        self: &Arc<Self>,
        inner: &mut Inner,
        command: TimerCommand,
    ) -> Result<Transition, TimerError> {
        let from = inner.countdown.state();
        let transition = inner.countdown.apply(command).inspect_err(|e| {
            debug!("Rejected timer command: {}", e);
        })?;

        if transition == Transition::Applied {
            let to = inner.countdown.state();
            let progress = if from.is_ticking() {
                self.disarm(inner)
            } else {
                Duration::ZERO
            };

            match to {
                TimerState::Paused => inner.carried = progress,
                TimerState::Running => {
                    let carried = std::mem::take(&mut inner.carried);
                    let carried = if command == TimerCommand::Resume {
                        carried
                    } else {
                        Duration::ZERO
                    };
                    self.arm(inner, carried);
                }
                TimerState::Idle | TimerState::Finished => inner.carried = Duration::ZERO,
            }

            self.publish(inner);
            info!(
                "Timer {}: {} -> {} ({}s remaining)",
                command,
                from,
                to,
                inner.countdown.remaining()
            );
        }

        Ok(transition)
    }

    fn set_duration(&self, inner: &mut Inner, duration: u64) -> Result<Transition, TimerError> {
        let unchanged = inner.countdown.duration() == duration;
        inner.countdown.set_duration(duration)?;
        if unchanged {
            return Ok(Transition::NoOp);
        }
        self.publish(inner);
        info!("Timer duration set to {}s", duration);
        Ok(Transition::Applied)
    }

    fn start_with(self: &Arc<Self>, inner: &mut Inner, duration: u64) -> Result<Transition, TimerError> {
        let state = inner.countdown.state();
        if state == TimerState::Paused {
            return self.apply(inner, TimerCommand::Resume);
        }
        if state.accepts_duration_change() {
            self.set_duration(inner, duration)?;
        }
        self.apply(inner, TimerCommand::Start)
    }

    fn reconfigure(
        self: &Arc<Self>,
        inner: &mut Inner,
        duration: u64,
        interrupt_running: bool,
    ) -> Result<Transition, TimerError> {
        if inner.countdown.state() == TimerState::Running && !interrupt_running {
            debug!("Timer running, keeping current length");
            return Ok(Transition::NoOp);
        }

        let reset = self.apply(inner, TimerCommand::Reset)?;
        let resized = self.set_duration(inner, duration)?;
        if reset == Transition::Applied || resized == Transition::Applied {
            Ok(Transition::Applied)
        } else {
            Ok(Transition::NoOp)
        }
    }

    /// Begin a new running period with its own tick task
    fn arm(self: &Arc<Self>, inner: &mut Inner, carried: Duration) {
        Self::cancel_ticker(inner);
        let generation = inner.generation;
        let period = Period::begin(Instant::now(), self.clock.now(), carried);
        let first_tick = period.anchor + TICK_INTERVAL;
        inner.period = Some(period);

        let shared = Arc::downgrade(self);
        inner.ticker = Some(self.runtime.spawn(run_ticker(shared, generation, first_tick)));
        debug!(
            "Tick task armed for generation {} ({}ms carried)",
            generation,
            carried.as_millis()
        );
    }

    /// End the current running period. Late ticks of it become no-ops.
    ///
    /// Returns the progress made toward the next tick.
    fn disarm(&self, inner: &mut Inner) -> Duration {
        Self::cancel_ticker(inner);
        inner
            .period
            .take()
            .map(|period| period.progress(period.elapsed(Instant::now(), self.clock.now())))
            .unwrap_or_default()
    }

    fn cancel_ticker(inner: &mut Inner) {
        inner.generation = inner.generation.wrapping_add(1);
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
    }

    /// Deliver whatever intervals have elapsed for `generation`.
    ///
    /// Returns when the tick task should wake next, or `None` once the period
    /// is over.
    fn deliver_tick(self: &Arc<Self>, generation: u64) -> Option<Instant> {
        let mut inner = self.lock_inner();
        if inner.generation != generation {
            return None;
        }

        let now = Instant::now();
        let wall_now = self.clock.now();
        let (intervals, next_tick) = {
            let period = inner.period.as_mut()?;
            let elapsed = period.elapsed(now, wall_now);
            let due = period.due(elapsed);
            let intervals = due - period.consumed;
            period.consumed = due;
            (intervals, now + interval_offset(due.saturating_add(1)).saturating_sub(elapsed))
        };

        let notifications = inner.countdown.elapse(intervals);
        if notifications.is_empty() {
            return Some(next_tick);
        }
        self.publish(&inner);

        let finished = inner.countdown.state() == TimerState::Finished;
        if finished {
            // The task is finishing on its own; dropping the handle detaches it.
            inner.ticker = None;
            inner.period = None;
            inner.generation = inner.generation.wrapping_add(1);
            info!("Timer finished");
        } else if intervals > 1 {
            debug!(
                "Collapsed {} missed intervals into one tick ({}s remaining)",
                intervals,
                inner.countdown.remaining()
            );
        }

        self.notify(&notifications);
        self.drain_deferred(&mut inner);

        (!finished && inner.generation == generation).then_some(next_tick)
    }

    fn notify(&self, notifications: &[Notification]) {
        let Some(observer) = self.observer() else {
            return;
        };

        let _guard = DeliveryGuard::enter(&self.delivering);
        for notification in notifications {
            match notification {
                Notification::Tick(remaining) => observer.on_tick(*remaining),
                Notification::Finished => observer.on_finished(),
            }
        }
    }

    fn drain_deferred(self: &Arc<Self>, inner: &mut Inner) {
        loop {
            let next = self
                .deferred
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some(op) = next else {
                break;
            };

            if let Err(e) = self.execute(inner, op) {
                warn!("Deferred timer operation {:?} failed: {}", op, e);
            }
        }
    }
}

/// Marks the current thread as delivering callbacks until dropped
struct DeliveryGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> DeliveryGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn interval_offset(intervals: u64) -> Duration {
    let nanos = u64::try_from(TICK_INTERVAL.as_nanos()).unwrap_or(u64::MAX);
    Duration::from_nanos(nanos.saturating_mul(intervals))
}

/// Tick loop for one running period
async fn run_ticker(shared: Weak<Shared>, generation: u64, first_tick: Instant) {
    let mut deadline = first_tick;

    loop {
        sleep_until(deadline).await;

        let Some(engine) = shared.upgrade() else {
            break;
        };
        match engine.deliver_tick(generation) {
            Some(next_tick) => deadline = next_tick,
            None => break,
        }
    }

    debug!("Tick task for generation {} exited", generation);
}
