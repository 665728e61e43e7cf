//! Shared machine for the two single-draw stages (deposition and crystal
//! growth): `Idle → Running → Completed`, no calibration, no cooldown.
//!
//! A powered tick credits elapsed time and energy and samples the defect
//! RNG. An unpowered tick marks the phase interrupted but still credits
//! elapsed time, so a starved phase runs out its clock without producing
//! anything. That clock-creep is inherited from the flight software and is
//! preserved deliberately.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{
    Disposition, FaultReason, FinishedJob, JobHandle, ModuleAction, ModuleQueue, ModuleState,
    OrbitPhase, PowerSource, StageAccess, TelemetryRow,
};

pub(super) struct BulkStage {
    access: StageAccess,
    power_w: u32,
    queue: ModuleQueue,
    state: ModuleState,
    rng: ChaCha8Rng,
}

impl BulkStage {
    pub(super) fn new(access: StageAccess, power_w: u32, rng: ChaCha8Rng) -> Self {
        BulkStage {
            access,
            power_w,
            queue: ModuleQueue::new(),
            state: ModuleState::Idle,
            rng,
        }
    }

    pub(super) fn state(&self) -> &ModuleState {
        &self.state
    }

    pub(super) fn enqueue(&mut self, job: JobHandle) {
        self.queue.push(job);
    }

    pub(super) fn discard(&mut self, job: JobHandle) {
        self.queue.remove(job);
        let holds_job = match self.state {
            ModuleState::Idle => false,
            ModuleState::Calibrating { job: j, .. }
            | ModuleState::Running { job: j }
            | ModuleState::CoolingDown { job: j, .. }
            | ModuleState::Completed { job: j }
            | ModuleState::Faulted { job: j, .. } => j == job,
        };
        if holds_job {
            self.state = ModuleState::Idle;
        }
    }

    pub(super) fn tick(
        &mut self,
        t: u64,
        orbit: OrbitPhase,
        power: &dyn PowerSource,
    ) -> Option<TelemetryRow> {
        match self.state {
            // Finished job still awaiting handoff; nothing to act on.
            ModuleState::Completed { .. } | ModuleState::Faulted { .. } => return None,
            ModuleState::Idle => {
                let job = self.queue.pop()?;
                self.state = ModuleState::Running { job };
            }
            ModuleState::Running { .. } => {}
            // Unreachable for bulk stages, which never calibrate or cool.
            ModuleState::Calibrating { .. } | ModuleState::CoolingDown { .. } => return None,
        }
        let ModuleState::Running { job } = self.state else {
            return None;
        };

        let consume = power.try_consume(self.power_w);
        let power_w = self.power_w;
        let rng = &mut self.rng;
        let (phase, action) = self.access.with_phase(job, |p| {
            let action = match consume {
                Ok(()) => {
                    p.elapsed_ticks += 1;
                    p.energy_used += u64::from(power_w);
                    if rng.gen::<f64>() < p.defect_chance {
                        p.defective = true;
                        ModuleAction::DefectDetected
                    } else {
                        ModuleAction::Progressed
                    }
                }
                Err(_) => {
                    p.was_interrupted = true;
                    p.elapsed_ticks += 1;
                    ModuleAction::PowerWait
                }
            };
            (p.clone(), action)
        });

        if phase.defective {
            self.state = ModuleState::Faulted {
                job,
                reason: FaultReason::DefectSampled,
            };
        } else if phase.is_done() {
            self.state = ModuleState::Completed { job };
        }

        let reading = power.reading();
        Some(TelemetryRow {
            minute: t,
            module: self.access.stage(),
            task_id: self.access.id(job),
            phase_index: self.access.stage().index() as u8,
            active: true,
            calibrating: false,
            cooldown_remaining: 0,
            elapsed: phase.elapsed_ticks,
            required: phase.required_ticks,
            energy_used: phase.energy_used,
            battery_level_wh: reading.battery_mwh / 1000,
            power_available_w: reading.budget_this_tick_w,
            interrupted: phase.was_interrupted,
            defective: phase.defective,
            orbit,
            action,
            reward: 0.0,
        })
    }

    pub(super) fn take_finished(&mut self) -> Option<FinishedJob> {
        let stage = self.access.stage();
        match self.state {
            ModuleState::Completed { job } => {
                self.state = ModuleState::Idle;
                Some(FinishedJob {
                    job,
                    stage,
                    disposition: Disposition::Completed,
                })
            }
            ModuleState::Faulted { job, reason } => {
                self.state = ModuleState::Idle;
                Some(FinishedJob {
                    job,
                    stage,
                    disposition: Disposition::Defective(reason),
                })
            }
            _ => None,
        }
    }
}
