//! Thin-film deposition, stage 0 of the pipeline.
//!
//! 300 W nominal draw, 60 ticks at the reference profile. No calibration or
//! cooldown; the chamber goes straight from queue to work.

use rand_chacha::ChaCha8Rng;

use crate::{
    FinishedJob, JobHandle, ModuleState, OrbitPhase, PowerSource, ProcessModule, Stage,
    StageAccess, TelemetryRow, Tunables,
};

use super::bulk::BulkStage;

pub struct DepositionModule {
    inner: BulkStage,
}

impl DepositionModule {
    /// `access` must be bound to [`Stage::Deposition`].
    pub fn new(access: StageAccess, tunables: &Tunables, rng: ChaCha8Rng) -> Self {
        debug_assert_eq!(access.stage(), Stage::Deposition);
        DepositionModule {
            inner: BulkStage::new(access, tunables.deposition_w, rng),
        }
    }
}

impl ProcessModule for DepositionModule {
    fn stage(&self) -> Stage {
        Stage::Deposition
    }

    fn state(&self) -> &ModuleState {
        self.inner.state()
    }

    fn enqueue(&mut self, job: JobHandle) {
        self.inner.enqueue(job);
    }

    fn discard(&mut self, job: JobHandle) {
        self.inner.discard(job);
    }

    fn tick(
        &mut self,
        t: u64,
        orbit: OrbitPhase,
        power: &dyn PowerSource,
    ) -> Option<TelemetryRow> {
        self.inner.tick(t, orbit, power)
    }

    fn take_finished(&mut self) -> Option<FinishedJob> {
        self.inner.take_finished()
    }
}
