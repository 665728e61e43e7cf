//! Supervisor-owned job storage with per-stage access control.
//!
//! Jobs live in an arena; everything else holds stable [`JobHandle`]
//! indices. Each phase record sits behind its own lock, and module code
//! reaches phase records only through a [`StageAccess`] bound to one stage,
//! making the single-writer rule structural rather than conventional. The
//! stage cursor is written by the supervisor alone.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Job, JobId, PhaseState, Stage};

/// Stable index of a job within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub(crate) usize);

impl JobHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

struct JobSlot {
    id: JobId,
    phases: [Mutex<PhaseState>; 3],
    /// 0..=3; 3 means the job has left the pipeline. Supervisor-written only.
    current_stage: AtomicU8,
}

pub struct JobArena {
    slots: Vec<JobSlot>,
}

impl JobArena {
    pub fn new(jobs: Vec<Job>) -> Self {
        let slots = jobs
            .into_iter()
            .map(|job| {
                let [p0, p1, p2] = job.phases;
                JobSlot {
                    id: job.id,
                    phases: [Mutex::new(p0), Mutex::new(p1), Mutex::new(p2)],
                    current_stage: AtomicU8::new(job.current_stage),
                }
            })
            .collect();
        JobArena { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = JobHandle> + '_ {
        (0..self.slots.len()).map(JobHandle)
    }

    pub fn id(&self, handle: JobHandle) -> &JobId {
        &self.slots[handle.0].id
    }

    pub fn current_stage(&self, handle: JobHandle) -> u8 {
        self.slots[handle.0].current_stage.load(Ordering::Acquire)
    }

    /// Advance the stage cursor. Supervisor-only; the cursor never moves
    /// backwards.
    pub fn set_stage(&self, handle: JobHandle, stage: u8) {
        let slot = &self.slots[handle.0];
        debug_assert!(stage >= slot.current_stage.load(Ordering::Acquire));
        slot.current_stage.store(stage, Ordering::Release);
    }

    pub fn is_job_complete(&self, handle: JobHandle) -> bool {
        self.current_stage(handle) >= 3
    }

    pub fn all_complete(&self) -> bool {
        self.handles().all(|h| self.is_job_complete(h))
    }

    /// Read-only copy of one phase record, for telemetry and reporting.
    pub fn phase_snapshot(&self, handle: JobHandle, stage: Stage) -> PhaseState {
        self.slots[handle.0].phases[stage.index()].lock().clone()
    }

    /// Full read-only copy of a job, for end-of-run reporting.
    pub fn job_snapshot(&self, handle: JobHandle) -> Job {
        let slot = &self.slots[handle.0];
        Job {
            id: slot.id.clone(),
            phases: [
                slot.phases[0].lock().clone(),
                slot.phases[1].lock().clone(),
                slot.phases[2].lock().clone(),
            ],
            current_stage: slot.current_stage.load(Ordering::Acquire),
        }
    }

    /// Writer capability for one stage's phase records. Hand one of these to
    /// the module that owns the stage; nothing else gets mutable access.
    pub fn stage_access(self: &Arc<Self>, stage: Stage) -> StageAccess {
        StageAccess {
            arena: Arc::clone(self),
            stage,
        }
    }
}

/// Mutable access to exactly one stage's phase records.
pub struct StageAccess {
    arena: Arc<JobArena>,
    stage: Stage,
}

impl StageAccess {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn id(&self, handle: JobHandle) -> JobId {
        self.arena.id(handle).clone()
    }

    /// Run `f` with this stage's phase record for `handle` locked.
    pub fn with_phase<R>(&self, handle: JobHandle, f: impl FnOnce(&mut PhaseState) -> R) -> R {
        let mut guard = self.arena.slots[handle.0].phases[self.stage.index()].lock();
        f(&mut guard)
    }

    pub fn snapshot(&self, handle: JobHandle) -> PhaseState {
        self.arena.phase_snapshot(handle, self.stage)
    }
}
