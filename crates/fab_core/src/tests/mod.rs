use std::sync::Arc;

use parking_lot::Mutex;

use crate::test_fixtures::{arena_with_jobs, base_tunables, make_rng};
use crate::*;

mod crystal_growth;
mod power;

// --- Shared test helpers ------------------------------------------------

fn bus(tunables: &Tunables) -> Mutex<PowerSubsystem> {
    Mutex::new(PowerSubsystem::new(tunables))
}

/// Refresh the bus for tick `t` and run one module tick, the way the
/// harness sequences them.
fn step(
    module: &mut dyn ProcessModule,
    t: u64,
    tunables: &Tunables,
    power: &Mutex<PowerSubsystem>,
) -> Option<TelemetryRow> {
    let orbit = orbit_phase(t, tunables);
    power.lock().refresh(t, orbit);
    module.tick(t, orbit, power)
}

fn deposition(arena: &Arc<JobArena>, tunables: &Tunables) -> DepositionModule {
    DepositionModule::new(arena.stage_access(Stage::Deposition), tunables, make_rng())
}

fn implanter(arena: &Arc<JobArena>, tunables: &Tunables) -> IonImplantModule {
    IonImplantModule::new(arena.stage_access(Stage::IonImplant), tunables, make_rng())
}

fn grower(arena: &Arc<JobArena>, tunables: &Tunables) -> CrystalGrowthModule {
    CrystalGrowthModule::new(arena.stage_access(Stage::CrystalGrowth), tunables, make_rng())
}
