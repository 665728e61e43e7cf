//! Orbit oracle: tick → illumination phase.
//!
//! Pure and side-effect free. An ephemeris-backed lookup can replace this
//! behind the same signature.

use crate::{OrbitPhase, Tunables};

/// Illumination phase for tick `t`: the first `sunlight_window_ticks` of
/// every `orbit_period_ticks`-long cycle are sunlight, the rest eclipse.
pub fn orbit_phase(t: u64, tunables: &Tunables) -> OrbitPhase {
    if t % tunables.orbit_period_ticks < tunables.sunlight_window_ticks {
        OrbitPhase::Sunlight
    } else {
        OrbitPhase::Eclipse
    }
}
