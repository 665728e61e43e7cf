//! Type definitions for `fab_core`.
//!
//! Job and phase records, stage identities, and the orbit phase enum.

use serde::{Deserialize, Serialize};

use crate::Tunables;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(JobId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// The three processing stages a wafer job passes through, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Deposition,
    IonImplant,
    CrystalGrowth,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Deposition, Stage::IonImplant, Stage::CrystalGrowth];

    /// Phase-record index for this stage (0..=2).
    pub fn index(self) -> usize {
        match self {
            Stage::Deposition => 0,
            Stage::IonImplant => 1,
            Stage::CrystalGrowth => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Stage> {
        Stage::ALL.get(index).copied()
    }

    /// The stage a job moves to after completing this one, if any.
    pub fn next(self) -> Option<Stage> {
        Stage::from_index(self.index() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Deposition => "deposition",
            Stage::IonImplant => "ion_implantation",
            Stage::CrystalGrowth => "crystal_growth",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Binary orbital illumination state, derived from the tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitPhase {
    Sunlight,
    Eclipse,
}

impl OrbitPhase {
    pub fn as_label(self) -> &'static str {
        match self {
            OrbitPhase::Sunlight => "sunlight",
            OrbitPhase::Eclipse => "eclipse",
        }
    }
}

/// Why a module handed a job back without completing its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultReason {
    /// The per-tick defect sample came up positive.
    DefectSampled,
    /// Power was lost while the implanter was calibrating.
    CalibrationStarved,
    /// Power was lost mid-implantation, poisoning the phase.
    ImplantPowerLoss,
}

impl FaultReason {
    pub fn as_label(self) -> &'static str {
        match self {
            FaultReason::DefectSampled => "defect_sampled",
            FaultReason::CalibrationStarved => "calibration_starved",
            FaultReason::ImplantPowerLoss => "implant_power_loss",
        }
    }
}

// ---------------------------------------------------------------------------
// Phase and job records
// ---------------------------------------------------------------------------

/// Per-stage bookkeeping for one job.
///
/// `elapsed_ticks` also advances on interrupted ticks for deposition and
/// crystal growth, so a starved phase still runs out its clock. This mirrors
/// the flight software; see the runbook before changing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Ticks of work this phase needs before it is done.
    pub required_ticks: u32,
    /// Ticks credited so far. Invariant: `elapsed_ticks <= required_ticks`.
    pub elapsed_ticks: u32,
    /// Cumulative watt-ticks charged to this phase.
    pub energy_used: u64,
    /// Sticky: set the first time a tick could not acquire power.
    pub was_interrupted: bool,
    /// Probability in [0, 1] of a defect per worked tick.
    pub defect_chance: f64,
    /// Sticky: once set, the phase is poisoned and the job leaves the line.
    pub defective: bool,
}

impl PhaseState {
    pub fn new(required_ticks: u32, defect_chance: f64) -> Self {
        PhaseState {
            required_ticks,
            elapsed_ticks: 0,
            energy_used: 0,
            was_interrupted: false,
            defect_chance,
            defective: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.elapsed_ticks >= self.required_ticks
    }

    pub fn ticks_remaining(&self) -> u32 {
        self.required_ticks.saturating_sub(self.elapsed_ticks)
    }
}

/// One wafer's full lifecycle across all three stages.
///
/// `current_stage` is a cursor in 0..=3; 3 means the job has left the
/// pipeline (completed or short-circuited by a defect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub phases: [PhaseState; 3],
    pub current_stage: u8,
}

impl Job {
    /// Build a fresh job with per-stage durations and defect chances from
    /// the tunables profile.
    pub fn from_profile(id: JobId, tunables: &Tunables) -> Self {
        Job {
            id,
            phases: [
                PhaseState::new(
                    tunables.deposition_ticks,
                    tunables.deposition_defect_chance,
                ),
                PhaseState::new(tunables.implant_ticks, tunables.implant_defect_chance),
                PhaseState::new(tunables.growth_ticks, tunables.growth_defect_chance),
            ],
            current_stage: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_stage >= 3
    }

    pub fn total_energy(&self) -> u64 {
        self.phases.iter().map(|p| p.energy_used).sum()
    }

    pub fn any_defective(&self) -> bool {
        self.phases.iter().any(|p| p.defective)
    }
}
