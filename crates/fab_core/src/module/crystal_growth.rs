//! Crystal growth, stage 2: the long tail of the pipeline.
//!
//! 250 W draw over 120 ticks at the reference profile. Behaviorally the same
//! machine as deposition: a long, simple consumer. If the process ever
//! needs thermal ramp dynamics, this is where the state machine grows.

use rand_chacha::ChaCha8Rng;

use crate::{
    FinishedJob, JobHandle, ModuleState, OrbitPhase, PowerSource, ProcessModule, Stage,
    StageAccess, TelemetryRow, Tunables,
};

use super::bulk::BulkStage;

pub struct CrystalGrowthModule {
    inner: BulkStage,
}

impl CrystalGrowthModule {
    /// `access` must be bound to [`Stage::CrystalGrowth`].
    pub fn new(access: StageAccess, tunables: &Tunables, rng: ChaCha8Rng) -> Self {
        debug_assert_eq!(access.stage(), Stage::CrystalGrowth);
        CrystalGrowthModule {
            inner: BulkStage::new(access, tunables.growth_w, rng),
        }
    }
}

impl ProcessModule for CrystalGrowthModule {
    fn stage(&self) -> Stage {
        Stage::CrystalGrowth
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
