//! Tick barrier: the supervisor publishes ticks, workers process each tick
//! exactly once, and the supervisor waits for all of them before moving on.
//!
//! The worker-side wait is a guarded predicate on a monotonic epoch counter,
//! so a spurious condvar wakeup can never double-process a tick. Shutdown
//! poisons the barrier: both wait sides return immediately once it is set.

use parking_lot::{Condvar, Mutex};

pub struct TickBarrier {
    state: Mutex<BarrierState>,
    release: Condvar,
    done: Condvar,
    workers: usize,
}

struct BarrierState {
    /// Number of ticks opened so far. Tick `t` is published as epoch `t + 1`,
    /// so a fresh worker (last seen epoch 0) picks up tick 0 correctly.
    epoch: u64,
    /// Workers that have reported completion for the current epoch.
    completed: usize,
    shutdown: bool,
}

impl TickBarrier {
    pub fn new(workers: usize) -> Self {
        TickBarrier {
            state: Mutex::new(BarrierState {
                epoch: 0,
                completed: 0,
                shutdown: false,
            }),
            release: Condvar::new(),
            done: Condvar::new(),
            workers,
        }
    }

    /// Publish tick `t` and wake all workers. Caller must have observed
    /// completion of the previous tick first.
    pub fn open_tick(&self, t: u64) {
        let mut state = self.state.lock();
        debug_assert_eq!(state.epoch, t, "ticks must be opened in order");
        state.epoch = t + 1;
        state.completed = 0;
        self.release.notify_all();
    }

    /// Block until an epoch newer than `last_epoch` is published, returning
    /// it, or `None` once the barrier is shut down.
    pub fn await_tick(&self, last_epoch: u64) -> Option<u64> {
        let mut state = self.state.lock();
        while state.epoch <= last_epoch && !state.shutdown {
            self.release.wait(&mut state);
        }
        if state.shutdown {
            None
        } else {
            Some(state.epoch)
        }
    }

    /// Worker-side: the current tick's work (including its telemetry row)
    /// is finished.
    pub fn report_done(&self) {
        let mut state = self.state.lock();
        state.completed += 1;
        if state.completed >= self.workers {
            self.done.notify_all();
        }
    }

    /// Supervisor-side: block until every worker has reported for the
    /// current tick (or the barrier is shut down).
    pub fn await_all_done(&self) {
        let mut state = self.state.lock();
        while state.completed < self.workers && !state.shutdown {
            self.done.wait(&mut state);
        }
    }

    /// Poison the barrier; all current and future waits return immediately.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.release.notify_all();
        self.done.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shutdown
    }
}
