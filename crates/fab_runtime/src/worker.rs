//! Module worker threads.
//!
//! Each worker owns its module outright; the supervisor talks to it through
//! a control channel (enqueue/discard) and reads finished jobs back off a
//! completion channel. Both channels are drained at tick boundaries, so the
//! module itself needs no locking.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use fab_core::{
    orbit_phase, FinishedJob, JobHandle, PowerSubsystem, ProcessModule, Stage, TelemetryWriter,
    Tunables,
};

use crate::TickBarrier;

enum WorkerCommand {
    Enqueue(JobHandle),
    Discard(JobHandle),
}

pub struct WorkerHandle {
    stage: Stage,
    commands: mpsc::Sender<WorkerCommand>,
    finished: mpsc::Receiver<FinishedJob>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Queue a job for this worker's module. Picked up at the next tick.
    pub fn enqueue(&self, job: JobHandle) {
        let _ = self.commands.send(WorkerCommand::Enqueue(job));
    }

    /// Tell the module to drop a job an earlier stage has poisoned.
    pub fn discard(&self, job: JobHandle) {
        let _ = self.commands.send(WorkerCommand::Discard(job));
    }

    /// Collect every job the module has handed off since the last call.
    pub fn drain_finished(&self) -> Vec<FinishedJob> {
        let mut finished = Vec::new();
        while let Ok(job) = self.finished.try_recv() {
            finished.push(job);
        }
        finished
    }

    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Spawn the worker thread for one module.
///
/// The loop is barrier-driven: wait for a new tick, apply queued commands,
/// run exactly one module tick, emit its telemetry row, hand off any
/// finished job, report done. Observing shutdown mid-wait exits the loop;
/// the tick being processed when shutdown lands still finishes, so the last
/// telemetry row per worker may or may not be written.
pub fn spawn_worker<M: ProcessModule + 'static>(
    mut module: M,
    barrier: Arc<TickBarrier>,
    power: Arc<Mutex<PowerSubsystem>>,
    telemetry: Arc<TelemetryWriter>,
    tunables: Tunables,
) -> WorkerHandle {
    let stage = module.stage();
    let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
    let (finished_tx, finished_rx) = mpsc::channel::<FinishedJob>();

    let thread = std::thread::Builder::new()
        .name(format!("fab-{}", stage.label()))
        .spawn(move || {
            let mut last_epoch = 0u64;
            while let Some(epoch) = barrier.await_tick(last_epoch) {
                last_epoch = epoch;
                let t = epoch - 1;

                while let Ok(command) = command_rx.try_recv() {
                    match command {
                        WorkerCommand::Enqueue(job) => module.enqueue(job),
                        WorkerCommand::Discard(job) => module.discard(job),
                    }
                }

                let orbit = orbit_phase(t, &tunables);
                if let Some(row) = module.tick(t, orbit, &*power) {
                    telemetry.write_row(&row);
                }
                if let Some(finished) = module.take_finished() {
                    let _ = finished_tx.send(finished);
                }

                barrier.report_done();
            }
            tracing::debug!("{} worker exiting", stage.label());
        })
        .expect("failed to spawn worker thread");

    WorkerHandle {
        stage,
        commands: command_tx,
        finished: finished_rx,
        thread: Some(thread),
    }
}
