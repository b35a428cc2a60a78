//! Transitions issued from one thread while ticks are delivered on others.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use egg_timer::{
    timer::{TimerEngine, TimerObserver, Transition},
    TimerState,
};
use tokio::time::sleep;

/// Records every tick that arrives while the gate is closed
#[derive(Default)]
struct Gate {
    open: AtomicBool,
    ticks: AtomicU64,
    late: Mutex<Vec<u64>>,
}

impl TimerObserver for Gate {
    fn on_tick(&self, remaining_seconds: u64) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        if !self.open.load(Ordering::SeqCst) {
            self.late.lock().unwrap().push(remaining_seconds);
        }
    }

    fn on_finished(&self) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_tick_lands_after_a_transition_returns() {
    let engine = TimerEngine::new(3600).unwrap();
    let gate = Arc::new(Gate::default());
    engine.observe(&gate);

    for cycle in 0..40u64 {
        gate.open.store(true, Ordering::SeqCst);
        let started = if engine.current_state() == TimerState::Paused {
            engine.resume()
        } else {
            engine.start()
        };
        assert_eq!(started, Ok(Transition::Applied));

        // Uneven running slices so transitions keep landing near tick boundaries
        sleep(Duration::from_millis(100 + (cycle * 53) % 150)).await;

        let ended = match cycle {
            19 => engine.stop(),
            39 => engine.reset(),
            _ => engine.pause(),
        };
        assert_eq!(ended, Ok(Transition::Applied));
        gate.open.store(false, Ordering::SeqCst);

        // A tick of the old period would show up here
        sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(*gate.late.lock().unwrap(), Vec::<u64>::new());
    assert!(gate.ticks.load(Ordering::SeqCst) >= 2);
    assert_eq!(engine.current_state(), TimerState::Idle);
    assert_eq!(engine.remaining_seconds(), 3600);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transitions_from_many_threads_keep_invariants() {
    let engine = Arc::new(TimerEngine::new(5).unwrap());

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for step in 0..200u64 {
                    let _ = match (worker + step) % 5 {
                        0 => engine.start(),
                        1 => engine.pause(),
                        2 => engine.resume(),
                        3 => engine.stop(),
                        _ => engine.reset(),
                    };
                    let snapshot = engine.snapshot();
                    assert!(snapshot.remaining_seconds <= snapshot.duration_seconds);
                    if snapshot.state == TimerState::Idle {
                        assert_eq!(snapshot.remaining_seconds, snapshot.duration_seconds);
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    engine.reset().unwrap();
    assert_eq!(engine.current_state(), TimerState::Idle);
    assert_eq!(engine.remaining_seconds(), 5);
}
