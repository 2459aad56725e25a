// src/engine/tracker.rs
// =============================================================================
// Completion tracker: counts outstanding tasks and owns the lifecycle phase.
//
// How it works:
// 1. `register` runs inside `Engine::submit`, before the task is queued, so
//    a worker can never finish a task whose increment has not happened yet
// 2. `finish` runs after a worker is done with a task
// 3. When the count drops to zero while Running, the phase flips to Draining
//    in the same critical section, so a racing `register` either sees
//    Running (and keeps the count above zero) or sees Draining (and fails)
// 4. `wait_for_zero` parks the lifecycle task on a Notify until that happens
//
// The counter and the phase share one mutex; nothing else in the engine is
// mutated by several workers at once.
// =============================================================================

use crate::error::EngineError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// Lifecycle of an engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; submissions are buffered until `run`
    Idle,
    /// Workers and drain loop active
    Running,
    /// Outstanding count hit zero; channels are being closed
    Draining,
    /// Completion signal emitted; the engine cannot be reused
    Closed,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    outstanding: usize,
}

#[derive(Debug)]
pub(crate) struct Tracker {
    state: Mutex<State>,
    zero: Notify,
    submitted: AtomicU64,
    completed: AtomicU64,
}

impl Tracker {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Idle,
                outstanding: 0,
            }),
            zero: Notify::new(),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Idle -> Running. Fails if the engine was started before.
    pub(crate) fn start(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.phase != Phase::Idle {
            return Err(EngineError::AlreadyStarted);
        }
        state.phase = Phase::Running;
        Ok(())
    }

    /// Counts one more outstanding task, unless submissions are closed
    pub(crate) fn register(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Idle | Phase::Running => {
                state.outstanding += 1;
                self.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            phase @ (Phase::Draining | Phase::Closed) => Err(EngineError::Closed { phase }),
        }
    }

    /// Marks one outstanding task as finished
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.outstanding > 0, "finish without matching register");
        state.outstanding -= 1;
        self.completed.fetch_add(1, Ordering::Relaxed);
        if state.outstanding == 0 && state.phase == Phase::Running {
            state.phase = Phase::Draining;
            // notify_one keeps a permit if the waiter is not parked yet
            self.zero.notify_one();
        }
    }

    /// Resolves once no task is outstanding; the phase is Draining afterwards
    pub(crate) async fn wait_for_zero(&self) {
        loop {
            {
                let mut state = self.state.lock();
                if state.phase == Phase::Running && state.outstanding == 0 {
                    state.phase = Phase::Draining;
                }
                if state.phase != Phase::Running {
                    return;
                }
            }
            self.zero.notified().await;
        }
    }

    /// Draining -> Closed
    pub(crate) fn close(&self) {
        self.state.lock().phase = Phase::Closed;
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    pub(crate) fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_register_while_idle_and_running() {
        let tracker = Tracker::new();
        tracker.register().unwrap();
        tracker.start().unwrap();
        tracker.register().unwrap();
        assert_eq!(tracker.outstanding(), 2);
        assert_eq!(tracker.submitted(), 2);
    }

    #[test]
    fn test_start_twice_fails() {
        let tracker = Tracker::new();
        tracker.start().unwrap();
        assert!(matches!(tracker.start(), Err(EngineError::AlreadyStarted)));
    }

    #[test]
    fn test_last_finish_moves_to_draining() {
        let tracker = Tracker::new();
        tracker.register().unwrap();
        tracker.start().unwrap();
        tracker.finish();
        assert_eq!(tracker.phase(), Phase::Draining);
        assert!(matches!(
            tracker.register(),
            Err(EngineError::Closed { phase: Phase::Draining })
        ));
    }

    #[test]
    fn test_register_after_close_fails() {
        let tracker = Tracker::new();
        tracker.start().unwrap();
        tracker.close();
        assert!(matches!(
            tracker.register(),
            Err(EngineError::Closed { phase: Phase::Closed })
        ));
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_with_nothing_outstanding() {
        let tracker = Tracker::new();
        tracker.start().unwrap();
        tokio::time::timeout(Duration::from_secs(1), tracker.wait_for_zero())
            .await
            .expect("wait should not block");
        assert_eq!(tracker.phase(), Phase::Draining);
    }

    #[tokio::test]
    async fn test_wait_blocks_until_last_finish() {
        let tracker = Arc::new(Tracker::new());
        tracker.register().unwrap();
        tracker.register().unwrap();
        tracker.start().unwrap();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.wait_for_zero().await })
        };

        tracker.finish();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(tracker.phase(), Phase::Running);

        tracker.finish();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert_eq!(tracker.completed(), 2);
    }
}
