//! Electrical subsystem: solar generation, battery storage, and the
//! per-tick power bus.
//!
//! `refresh` runs exactly once per tick, before any module work, and sets up
//! the tick's budget. `consume` is an atomic reserve-and-debit; solar output
//! is spent before battery charge within a tick, so the aggregate outcome is
//! the same no matter which module reaches the bus first.
//!
//! The struct itself is single-threaded. Concurrent access goes through a
//! `Mutex<PowerSubsystem>`, which implements [`PowerSource`], the seam the
//! modules consume power through.

use parking_lot::Mutex;

use crate::{OrbitPhase, PowerError, Tunables};

// ---------------------------------------------------------------------------
// PowerSubsystem
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PowerSubsystem {
    battery_capacity_mwh: u64,
    battery_mwh: u64,
    solar_sunlight_w: u32,
    solar_eclipse_w: u32,
    max_battery_draw_w: u32,

    // Per-tick scratch, reset by refresh().
    produced_this_tick_w: u32,
    solar_remaining_w: u32,
    budget_this_tick_w: u32,
    refreshed_tick: Option<u64>,
    consumed_this_tick: bool,
}

impl PowerSubsystem {
    /// Starts with a full battery, matching launch configuration.
    pub fn new(tunables: &Tunables) -> Self {
        PowerSubsystem {
            battery_capacity_mwh: tunables.battery_capacity_mwh,
            battery_mwh: tunables.battery_capacity_mwh,
            solar_sunlight_w: tunables.solar_sunlight_w,
            solar_eclipse_w: tunables.solar_eclipse_w,
            max_battery_draw_w: tunables.max_battery_draw_w,
            produced_this_tick_w: 0,
            solar_remaining_w: 0,
            budget_this_tick_w: 0,
            refreshed_tick: None,
            consumed_this_tick: false,
        }
    }

    fn solar_generation(&self, phase: OrbitPhase) -> u32 {
        match phase {
            OrbitPhase::Sunlight => self.solar_sunlight_w,
            OrbitPhase::Eclipse => self.solar_eclipse_w,
        }
    }

    /// Set up this tick's budget: credit the battery with solar output
    /// (clamped to capacity), then expose solar plus a capped battery draw
    /// as the bus budget.
    ///
    /// Called once per tick, before any `consume`. A repeated call for the
    /// same tick is a no-op while nothing has consumed; re-refreshing after
    /// a reservation is a sequencing bug in the caller.
    pub fn refresh(&mut self, t: u64, phase: OrbitPhase) {
        if self.refreshed_tick == Some(t) {
            debug_assert!(
                !self.consumed_this_tick,
                "refresh({t}) repeated after a consume in the same tick"
            );
            return;
        }
        self.refreshed_tick = Some(t);
        self.consumed_this_tick = false;

        self.produced_this_tick_w = self.solar_generation(phase);
        self.battery_mwh = (self.battery_mwh + u64::from(self.produced_this_tick_w))
            .min(self.battery_capacity_mwh);
        self.solar_remaining_w = self.produced_this_tick_w;

        let battery_draw_potential =
            u64::from(self.max_battery_draw_w).min(self.battery_mwh) as u32;
        self.budget_this_tick_w = self.produced_this_tick_w + battery_draw_potential;
    }

    /// Pure check against the remaining budget. A true result is only a
    /// hint under concurrency; `consume` is the authoritative operation.
    pub fn can_satisfy(&self, watts: u32) -> bool {
        watts <= self.budget_this_tick_w
    }

    /// Reserve and debit `watts` from this tick's budget, drawing whatever
    /// solar cannot cover from the battery. On failure the state is
    /// unchanged.
    pub fn consume(&mut self, watts: u32) -> Result<(), PowerError> {
        if watts > self.budget_this_tick_w {
            return Err(PowerError::Insufficient {
                requested: watts,
                budget: self.budget_this_tick_w,
            });
        }
        self.budget_this_tick_w -= watts;
        self.consumed_this_tick = true;

        let from_solar = watts.min(self.solar_remaining_w);
        self.solar_remaining_w -= from_solar;
        let from_battery = watts - from_solar;
        self.battery_mwh = self.battery_mwh.saturating_sub(u64::from(from_battery));
        Ok(())
    }

    // --- Observers ---

    pub fn battery_mwh(&self) -> u64 {
        self.battery_mwh
    }

    pub fn budget_this_tick_w(&self) -> u32 {
        self.budget_this_tick_w
    }

    pub fn produced_this_tick_w(&self) -> u32 {
        self.produced_this_tick_w
    }

    pub fn reading(&self) -> PowerReading {
        PowerReading {
            battery_mwh: self.battery_mwh,
            budget_this_tick_w: self.budget_this_tick_w,
            produced_this_tick_w: self.produced_this_tick_w,
        }
    }
}

/// Consistent snapshot of the bus, taken under the lock.
#[derive(Debug, Clone, Copy)]
pub struct PowerReading {
    pub battery_mwh: u64,
    pub budget_this_tick_w: u32,
    pub produced_this_tick_w: u32,
}

// ---------------------------------------------------------------------------
// PowerSource: the seam modules draw power through
// ---------------------------------------------------------------------------

/// Shared-bus access as seen from a module. Mutations are serialized by the
/// implementation; observers see only completed mutations.
pub trait PowerSource: Sync {
    fn can_satisfy(&self, watts: u32) -> bool;
    /// Atomic reserve-and-debit. Never blocks beyond the bus lock.
    fn try_consume(&self, watts: u32) -> Result<(), PowerError>;
    fn reading(&self) -> PowerReading;
}

impl PowerSource for Mutex<PowerSubsystem> {
    fn can_satisfy(&self, watts: u32) -> bool {
        self.lock().can_satisfy(watts)
    }

    fn try_consume(&self, watts: u32) -> Result<(), PowerError> {
        self.lock().consume(watts)
    }

    fn reading(&self) -> PowerReading {
        self.lock().reading()
    }
}
