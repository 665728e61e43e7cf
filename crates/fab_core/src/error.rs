//! Typed errors for the power reservation protocol.

use thiserror::Error;

/// Failure to reserve power from the per-tick bus budget.
///
/// Transient by design: modules fold it into the job's phase flags instead
/// of propagating it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    #[error("insufficient power: requested {requested} W, budget {budget} W")]
    Insufficient { requested: u32, budget: u32 },
}
