//! fab_core: deterministic fab-line simulation primitives.
//!
//! No IO apart from the telemetry writer. All randomness via seeded,
//! per-module RNGs so a run is reproducible from its seed.

mod arena;
mod config;
mod error;
mod module;
mod orbit;
mod power;
mod queue;
mod telemetry;
mod types;

pub mod test_fixtures;

pub use arena::{JobArena, JobHandle, StageAccess};
pub use config::Tunables;
pub use error::PowerError;
pub use module::{
    crystal_growth::CrystalGrowthModule, deposition::DepositionModule,
    ion_implant::IonImplantModule, Disposition, FinishedJob, ModuleState, ProcessModule,
};
pub use orbit::orbit_phase;
pub use power::{PowerReading, PowerSource, PowerSubsystem};
pub use queue::ModuleQueue;
pub use telemetry::{ModuleAction, TelemetryRow, TelemetryWriter, TELEMETRY_HEADER};
pub use types::{FaultReason, Job, JobId, OrbitPhase, PhaseState, Stage};

#[cfg(test)]
mod tests;
