//! The supervisor: wires the world together, drives the clock, and routes
//! jobs between stages.
//!
//! Per tick, strictly in order: refresh the power bus (no worker is running
//! at that instant), open the barrier, wait for all workers, then transfer
//! finished jobs. A completed stage moves the job to the next module's
//! queue; a defective one short-circuits the job off the line and tells the
//! later modules to forget it.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fab_core::{
    orbit_phase, CrystalGrowthModule, DepositionModule, Disposition, IonImplantModule, Job,
    JobArena, PowerSubsystem, Stage, TelemetryWriter, Tunables,
};

use crate::{spawn_worker, TickBarrier, WorkerHandle};

pub struct RunConfig {
    pub tunables: Tunables,
    /// Base seed; each module's defect RNG derives from it and the stage
    /// index, so runs are reproducible end to end.
    pub seed: u64,
    /// Emit a progress log line every N ticks. None = quiet.
    pub progress_every: Option<u64>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub completed: u32,
    pub defective: u32,
    pub final_battery_mwh: u64,
    /// Final state of every job, in load order.
    pub jobs: Vec<Job>,
}

fn stage_rng(seed: u64, stage: Stage) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.wrapping_add(stage.index() as u64))
}

/// Run the simulation to completion: duration exhausted or every job off
/// the line. Blocks until all workers have joined and telemetry is flushed.
pub fn run(jobs: Vec<Job>, config: &RunConfig, telemetry: Arc<TelemetryWriter>) -> RunSummary {
    let tunables = &config.tunables;
    let arena = Arc::new(JobArena::new(jobs));
    let power = Arc::new(Mutex::new(PowerSubsystem::new(tunables)));
    let barrier = Arc::new(TickBarrier::new(3));

    tracing::info!(
        jobs = arena.len(),
        duration_ticks = tunables.sim_duration_ticks,
        seed = config.seed,
        "starting fab line"
    );

    let workers: [WorkerHandle; 3] = [
        spawn_worker(
            DepositionModule::new(
                arena.stage_access(Stage::Deposition),
                tunables,
                stage_rng(config.seed, Stage::Deposition),
            ),
            Arc::clone(&barrier),
            Arc::clone(&power),
            Arc::clone(&telemetry),
            tunables.clone(),
        ),
        spawn_worker(
            IonImplantModule::new(
                arena.stage_access(Stage::IonImplant),
                tunables,
                stage_rng(config.seed, Stage::IonImplant),
            ),
            Arc::clone(&barrier),
            Arc::clone(&power),
            Arc::clone(&telemetry),
            tunables.clone(),
        ),
        spawn_worker(
            CrystalGrowthModule::new(
                arena.stage_access(Stage::CrystalGrowth),
                tunables,
                stage_rng(config.seed, Stage::CrystalGrowth),
            ),
            Arc::clone(&barrier),
            Arc::clone(&power),
            Arc::clone(&telemetry),
            tunables.clone(),
        ),
    ];

    // Everything starts at deposition.
    for handle in arena.handles() {
        workers[Stage::Deposition.index()].enqueue(handle);
    }

    let mut completed = 0u32;
    let mut defective = 0u32;
    let mut ticks_run = 0u64;

    for t in 0..tunables.sim_duration_ticks {
        if arena.all_complete() {
            tracing::info!(tick = t, "all jobs off the line, stopping early");
            break;
        }

        power.lock().refresh(t, orbit_phase(t, tunables));
        barrier.open_tick(t);
        barrier.await_all_done();
        ticks_run = t + 1;

        for worker in &workers {
            for finished in worker.drain_finished() {
                match finished.disposition {
                    Disposition::Completed => match finished.stage.next() {
                        Some(next) => {
                            arena.set_stage(finished.job, next.index() as u8);
                            workers[next.index()].enqueue(finished.job);
                        }
                        None => {
                            arena.set_stage(finished.job, 3);
                            completed += 1;
                            tracing::debug!(
                                job = %arena.id(finished.job),
                                "job completed all stages"
                            );
                        }
                    },
                    Disposition::Defective(reason) => {
                        arena.set_stage(finished.job, 3);
                        defective += 1;
                        tracing::debug!(
                            job = %arena.id(finished.job),
                            stage = finished.stage.label(),
                            reason = reason.as_label(),
                            "job scrapped"
                        );
                        for later in (finished.stage.index() + 1)..3 {
                            workers[later].discard(finished.job);
                        }
                    }
                }
            }
        }

        if let Some(every) = config.progress_every {
            if every > 0 && (t + 1) % every == 0 {
                tracing::info!(
                    tick = t,
                    completed,
                    defective,
                    battery_mwh = power.lock().battery_mwh(),
                    "progress"
                );
            }
        }
    }

    barrier.shutdown();
    for worker in workers {
        worker.join();
    }
    telemetry.flush();

    let final_battery_mwh = power.lock().battery_mwh();
    let jobs = arena.handles().map(|h| arena.job_snapshot(h)).collect();

    tracing::info!(
        ticks_run,
        completed,
        defective,
        final_battery_mwh,
        "fab line finished"
    );

    RunSummary {
        ticks_run,
        completed,
        defective,
        final_battery_mwh,
        jobs,
    }
}
