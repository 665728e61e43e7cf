//! Shared test fixtures for fab_core and downstream crates.
//!
//! `base_tunables()` compresses stage durations so pipeline tests finish in
//! tens of ticks, zeroes the defect chances for predictability, and keeps
//! the reference power numbers. Tests that want stochastic defects or
//! starvation override the relevant fields.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{Job, JobArena, JobId, Tunables};

/// Reference power profile with compressed durations and no defects.
pub fn base_tunables() -> Tunables {
    Tunables {
        deposition_ticks: 5,
        implant_ticks: 6,
        growth_ticks: 8,
        deposition_defect_chance: 0.0,
        implant_defect_chance: 0.0,
        growth_defect_chance: 0.0,
        implant_calibration_ticks: 3,
        implant_cooldown_ticks: 5,
        sim_duration_ticks: 200,
        ..Tunables::default()
    }
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// Build `count` jobs named `T_1..=T_count` from the given profile.
pub fn make_jobs(count: usize, tunables: &Tunables) -> Vec<Job> {
    (1..=count)
        .map(|i| Job::from_profile(JobId(format!("T_{i}")), tunables))
        .collect()
}

pub fn arena_with_jobs(count: usize, tunables: &Tunables) -> Arc<JobArena> {
    Arc::new(JobArena::new(make_jobs(count, tunables)))
}
