//! Simulation tunables.
//!
//! A flat struct so a JSON override file or CLI flags can reach every knob.
//! Defaults are the reference mission profile.

use serde::{Deserialize, Serialize};

use crate::types::Stage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    // --- Power subsystem ---
    /// Battery capacity in milliwatt-hours.
    pub battery_capacity_mwh: u64,
    /// Solar output per tick while in sunlight (W).
    pub solar_sunlight_w: u32,
    /// Solar output per tick while in eclipse (W).
    pub solar_eclipse_w: u32,
    /// Hard cap on battery draw within a single tick (W), regardless of
    /// remaining charge.
    pub max_battery_draw_w: u32,

    // --- Clock and orbit ---
    /// Simulation length in ticks (one tick = one simulated minute).
    pub sim_duration_ticks: u64,
    pub orbit_period_ticks: u64,
    pub sunlight_window_ticks: u64,

    // --- Stage power draws ---
    pub deposition_w: u32,
    pub implant_w: u32,
    pub growth_w: u32,

    // --- Stage durations ---
    pub deposition_ticks: u32,
    pub implant_ticks: u32,
    pub growth_ticks: u32,

    // --- Stage defect chances ---
    pub deposition_defect_chance: f64,
    pub implant_defect_chance: f64,
    pub growth_defect_chance: f64,

    // --- Ion implanter auxiliaries ---
    pub implant_calibration_ticks: u32,
    pub implant_calibration_w: u32,
    pub implant_cooldown_ticks: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            battery_capacity_mwh: 250_000,
            solar_sunlight_w: 300,
            solar_eclipse_w: 0,
            max_battery_draw_w: 300,
            sim_duration_ticks: 1440,
            orbit_period_ticks: 90,
            sunlight_window_ticks: 45,
            deposition_w: 300,
            implant_w: 200,
            growth_w: 250,
            deposition_ticks: 60,
            implant_ticks: 20,
            growth_ticks: 120,
            deposition_defect_chance: 0.010,
            implant_defect_chance: 0.001,
            growth_defect_chance: 0.025,
            implant_calibration_ticks: 3,
            implant_calibration_w: 100,
            implant_cooldown_ticks: 5,
        }
    }
}

impl Tunables {
    /// Nominal running draw for a stage (W per tick).
    pub fn stage_power_w(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Deposition => self.deposition_w,
            Stage::IonImplant => self.implant_w,
            Stage::CrystalGrowth => self.growth_w,
        }
    }

    pub fn stage_required_ticks(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Deposition => self.deposition_ticks,
            Stage::IonImplant => self.implant_ticks,
            Stage::CrystalGrowth => self.growth_ticks,
        }
    }

    pub fn stage_defect_chance(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Deposition => self.deposition_defect_chance,
            Stage::IonImplant => self.implant_defect_chance,
            Stage::CrystalGrowth => self.growth_defect_chance,
        }
    }
}
