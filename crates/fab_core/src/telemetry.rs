//! Structured telemetry: one CSV row per (tick, module, job) action.
//!
//! The row schema is consumed downstream by the scheduling-model training
//! pipeline; column order is part of the contract. `reward` is reserved for
//! that consumer and always written as `0.0` here.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::{JobId, OrbitPhase, Stage};

pub const TELEMETRY_HEADER: &str = "minute,module,task_id,phase_index,active,calibrating,\
     cooldown_remaining,elapsed,required,energy_used,battery_level_wh,power_available_w,\
     interrupted,defective,orbit,action,reward";

/// What the module did with its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAction {
    /// A unit of work was powered and credited.
    Progressed,
    /// Power reservation failed; the tick was lost to the outage.
    PowerWait,
    /// The implanter spent the tick calibrating.
    Calibrating,
    /// The implanter is cooling down between jobs.
    CoolingDown,
    /// The defect sample came up positive this tick.
    DefectDetected,
}

impl ModuleAction {
    pub fn as_label(self) -> &'static str {
        match self {
            ModuleAction::Progressed => "progressed",
            ModuleAction::PowerWait => "waiting_power",
            ModuleAction::Calibrating => "calibrating",
            ModuleAction::CoolingDown => "cooldown",
            ModuleAction::DefectDetected => "defect",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryRow {
    pub minute: u64,
    pub module: Stage,
    pub task_id: JobId,
    pub phase_index: u8,
    pub active: bool,
    pub calibrating: bool,
    pub cooldown_remaining: u32,
    pub elapsed: u32,
    pub required: u32,
    pub energy_used: u64,
    /// Battery charge in whole watt-hours (mWh / 1000, truncated).
    pub battery_level_wh: u64,
    /// Bus budget remaining after this module's action (W).
    pub power_available_w: u32,
    pub interrupted: bool,
    pub defective: bool,
    pub orbit: OrbitPhase,
    pub action: ModuleAction,
    pub reward: f32,
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

impl TelemetryRow {
    fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{:.1}",
            self.minute,
            self.module.label(),
            self.task_id,
            self.phase_index,
            flag(self.active),
            flag(self.calibrating),
            self.cooldown_remaining,
            self.elapsed,
            self.required,
            self.energy_used,
            self.battery_level_wh,
            self.power_available_w,
            flag(self.interrupted),
            flag(self.defective),
            self.orbit.as_label(),
            self.action.as_label(),
            self.reward,
        )
    }
}

// ---------------------------------------------------------------------------
// TelemetryWriter
// ---------------------------------------------------------------------------

/// Append-only CSV sink shared by all module workers.
///
/// All writes go through an internal mutex. A failed write is reported once
/// via `tracing::error!` and telemetry is suppressed for the rest of the
/// run; the simulation itself keeps going.
pub struct TelemetryWriter {
    // None once the sink has failed.
    out: Mutex<Option<BufWriter<File>>>,
}

impl TelemetryWriter {
    /// Create (truncate) the sink file and write the header row.
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{TELEMETRY_HEADER}")?;
        Ok(TelemetryWriter {
            out: Mutex::new(Some(out)),
        })
    }

    pub fn write_row(&self, row: &TelemetryRow) {
        let mut guard = self.out.lock();
        let Some(out) = guard.as_mut() else {
            return;
        };
        if let Err(err) = row.write_to(out) {
            tracing::error!("telemetry sink failed, suppressing further rows: {err}");
            *guard = None;
        }
    }

    /// Flush buffered rows to disk. Called on shutdown; also safe mid-run.
    pub fn flush(&self) {
        let mut guard = self.out.lock();
        if let Some(out) = guard.as_mut() {
            if let Err(err) = out.flush() {
                tracing::error!("telemetry flush failed: {err}");
                *guard = None;
            }
        }
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> TelemetryRow {
        TelemetryRow {
            minute: 7,
            module: Stage::Deposition,
            task_id: JobId("T_1".to_string()),
            phase_index: 0,
            active: true,
            calibrating: false,
            cooldown_remaining: 0,
            elapsed: 8,
            required: 60,
            energy_used: 2400,
            battery_level_wh: 250,
            power_available_w: 0,
            interrupted: false,
            defective: false,
            orbit: OrbitPhase::Sunlight,
            action: ModuleAction::Progressed,
            reward: 0.0,
        }
    }

    #[test]
    fn header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.csv");
        let writer = TelemetryWriter::create(&path).unwrap();
        writer.write_row(&sample_row());
        writer.write_row(&sample_row());
        writer.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TELEMETRY_HEADER);
        assert_eq!(
            lines[1],
            "7,deposition,T_1,0,1,0,0,8,60,2400,250,0,0,0,sunlight,progressed,0.0"
        );
    }

    #[test]
    fn rows_use_lf_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.csv");
        let writer = TelemetryWriter::create(&path).unwrap();
        writer.write_row(&sample_row());
        writer.flush();

        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.windows(2).any(|w| w == b"\r\n"), "no CRLF anywhere");
    }
}
