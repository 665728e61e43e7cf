//! Ion implantation, stage 1: the fussy one.
//!
//! The beamline needs a 3-tick, 100 W calibration pass before each job and a
//! 5-tick cooldown after. Power behavior is stricter than the bulk stages:
//! losing power during calibration or mid-implant poisons the phase, since a
//! half-aligned beam or a truncated dose cannot be recovered.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{
    Disposition, FaultReason, FinishedJob, JobHandle, ModuleAction, ModuleQueue, ModuleState,
    OrbitPhase, PowerReading, PowerSource, ProcessModule, Stage, StageAccess, TelemetryRow,
    Tunables,
};

pub struct IonImplantModule {
    access: StageAccess,
    run_w: u32,
    calibration_w: u32,
    calibration_ticks: u32,
    cooldown_ticks: u32,
    queue: ModuleQueue,
    state: ModuleState,
    rng: ChaCha8Rng,
}

impl IonImplantModule {
    /// `access` must be bound to [`Stage::IonImplant`].
    pub fn new(access: StageAccess, tunables: &Tunables, rng: ChaCha8Rng) -> Self {
        debug_assert_eq!(access.stage(), Stage::IonImplant);
        IonImplantModule {
            access,
            run_w: tunables.implant_w,
            calibration_w: tunables.implant_calibration_w,
            calibration_ticks: tunables.implant_calibration_ticks,
            cooldown_ticks: tunables.implant_cooldown_ticks,
            queue: ModuleQueue::new(),
            state: ModuleState::Idle,
            rng,
        }
    }

    fn row(
        &self,
        t: u64,
        orbit: OrbitPhase,
        job: JobHandle,
        reading: PowerReading,
        action: ModuleAction,
    ) -> TelemetryRow {
        let phase = self.access.snapshot(job);
        let (active, calibrating, cooldown_remaining) = match self.state {
            ModuleState::Calibrating { .. } => (true, true, 0),
            ModuleState::CoolingDown { remaining, .. } => (false, false, remaining),
            _ => (true, false, 0),
        };
        TelemetryRow {
            minute: t,
            module: Stage::IonImplant,
            task_id: self.access.id(job),
            phase_index: Stage::IonImplant.index() as u8,
            active,
            calibrating,
            cooldown_remaining,
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
        }
    }

    fn calibration_tick(&mut self, job: JobHandle, remaining: u32, power: &dyn PowerSource) -> ModuleAction {
        match power.try_consume(self.calibration_w) {
            Ok(()) => {
                let calibration_w = self.calibration_w;
                let phase = self.access.with_phase(job, |p| {
                    p.elapsed_ticks += 1;
                    p.energy_used += u64::from(calibration_w);
                    p.clone()
                });
                let remaining = remaining - 1;
                self.state = if phase.is_done() {
                    ModuleState::Completed { job }
                } else if remaining == 0 {
                    ModuleState::Running { job }
                } else {
                    ModuleState::Calibrating { job, remaining }
                };
                ModuleAction::Calibrating
            }
            Err(_) => {
                // A power dip mid-alignment scraps the wafer.
                self.access.with_phase(job, |p| {
                    p.was_interrupted = true;
                    p.defective = true;
                });
                self.state = ModuleState::Faulted {
                    job,
                    reason: FaultReason::CalibrationStarved,
                };
                ModuleAction::PowerWait
            }
        }
    }

    fn run_tick(&mut self, job: JobHandle, power: &dyn PowerSource) -> ModuleAction {
        match power.try_consume(self.run_w) {
            Ok(()) => {
                let run_w = self.run_w;
                let rng = &mut self.rng;
                let phase = self.access.with_phase(job, |p| {
                    p.elapsed_ticks += 1;
                    p.energy_used += u64::from(run_w);
                    if rng.gen::<f64>() < p.defect_chance {
                        p.defective = true;
                    }
                    p.clone()
                });
                if phase.defective {
                    self.state = ModuleState::Faulted {
                        job,
                        reason: FaultReason::DefectSampled,
                    };
                    ModuleAction::DefectDetected
                } else {
                    if phase.is_done() {
                        self.state = ModuleState::Completed { job };
                    }
                    ModuleAction::Progressed
                }
            }
            Err(_) => {
                // An interrupted dose is a wrong dose; the clock still runs.
                self.access.with_phase(job, |p| {
                    p.was_interrupted = true;
                    p.defective = true;
                    p.elapsed_ticks += 1;
                });
                self.state = ModuleState::Faulted {
                    job,
                    reason: FaultReason::ImplantPowerLoss,
                };
                ModuleAction::PowerWait
            }
        }
    }
}

impl ProcessModule for IonImplantModule {
    fn stage(&self) -> Stage {
        Stage::IonImplant
    }

    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn enqueue(&mut self, job: JobHandle) {
        self.queue.push(job);
    }

    fn discard(&mut self, job: JobHandle) {
        self.queue.remove(job);
        // Cooldown is a property of the machine, not the job: discarding the
        // departed job must not cut the rest period short.
        let holds_job = match self.state {
            ModuleState::Calibrating { job: j, .. }
            | ModuleState::Running { job: j }
            | ModuleState::Completed { job: j }
            | ModuleState::Faulted { job: j, .. } => j == job,
            ModuleState::Idle | ModuleState::CoolingDown { .. } => false,
        };
        if holds_job {
            self.state = ModuleState::Idle;
        }
    }

    fn tick(
        &mut self,
        t: u64,
        orbit: OrbitPhase,
        power: &dyn PowerSource,
    ) -> Option<TelemetryRow> {
        match self.state {
            // Finished job still awaiting handoff; nothing to act on.
            ModuleState::Completed { .. } | ModuleState::Faulted { .. } => return None,
            ModuleState::CoolingDown { job, remaining } => {
                // Report the cooldown even though no work happens; the row
                // keeps carrying the departed job's id.
                let remaining = remaining - 1;
                self.state = ModuleState::CoolingDown { job, remaining };
                let row = self.row(t, orbit, job, power.reading(), ModuleAction::CoolingDown);
                if remaining == 0 {
                    self.state = ModuleState::Idle;
                }
                return Some(row);
            }
            ModuleState::Idle => {
                let job = self.queue.pop()?;
                self.state = if self.calibration_ticks > 0 {
                    ModuleState::Calibrating {
                        job,
                        remaining: self.calibration_ticks,
                    }
                } else {
                    ModuleState::Running { job }
                };
            }
            ModuleState::Calibrating { .. } | ModuleState::Running { .. } => {}
        }

        let (job, action) = match self.state {
            ModuleState::Calibrating { job, remaining } => {
                (job, self.calibration_tick(job, remaining, power))
            }
            ModuleState::Running { job } => (job, self.run_tick(job, power)),
            _ => return None,
        };

        Some(self.row(t, orbit, job, power.reading(), action))
    }

    fn take_finished(&mut self) -> Option<FinishedJob> {
        match self.state {
            ModuleState::Completed { job } => {
                // The beamline rests after a completed implant before the
                // next job may start.
                self.state = if self.cooldown_ticks > 0 {
                    ModuleState::CoolingDown {
                        job,
                        remaining: self.cooldown_ticks,
                    }
                } else {
                    ModuleState::Idle
                };
                Some(FinishedJob {
                    job,
                    stage: Stage::IonImplant,
                    disposition: Disposition::Completed,
                })
            }
            ModuleState::Faulted { job, reason } => {
                self.state = ModuleState::Idle;
                Some(FinishedJob {
                    job,
                    stage: Stage::IonImplant,
                    disposition: Disposition::Defective(reason),
                })
            }
            _ => None,
        }
    }
}
