use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fab_core::{TelemetryWriter, Tunables};
use fab_runtime::{RunConfig, RunSummary};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "fab_cli", about = "Orbital Fab Simulator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fab line over a job roster and write telemetry.
    Run {
        /// Job roster: one wafer id per line.
        #[arg(long)]
        jobs: PathBuf,
        /// Telemetry CSV output path.
        #[arg(long)]
        out: PathBuf,
        /// Base RNG seed for defect sampling.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Tunables JSON file; unset fields keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Log a progress line every N ticks. 0 = quiet.
        #[arg(long, default_value_t = 100)]
        print_every: u64,
        #[command(flatten)]
        overrides: TunableOverrides,
    },
}

/// Per-tunable CLI overrides, applied on top of the config file (or the
/// defaults). Flags mirror the field names of [`Tunables`].
#[derive(Args)]
struct TunableOverrides {
    #[arg(long)]
    battery_capacity_mwh: Option<u64>,
    #[arg(long)]
    solar_sunlight_w: Option<u32>,
    #[arg(long)]
    solar_eclipse_w: Option<u32>,
    #[arg(long)]
    max_battery_draw_w: Option<u32>,
    #[arg(long)]
    sim_duration_ticks: Option<u64>,
    #[arg(long)]
    orbit_period_ticks: Option<u64>,
    #[arg(long)]
    sunlight_window_ticks: Option<u64>,
    #[arg(long)]
    deposition_w: Option<u32>,
    #[arg(long)]
    implant_w: Option<u32>,
    #[arg(long)]
    growth_w: Option<u32>,
    #[arg(long)]
    deposition_ticks: Option<u32>,
    #[arg(long)]
    implant_ticks: Option<u32>,
    #[arg(long)]
    growth_ticks: Option<u32>,
    #[arg(long)]
    deposition_defect_chance: Option<f64>,
    #[arg(long)]
    implant_defect_chance: Option<f64>,
    #[arg(long)]
    growth_defect_chance: Option<f64>,
    #[arg(long)]
    implant_calibration_ticks: Option<u32>,
    #[arg(long)]
    implant_calibration_w: Option<u32>,
    #[arg(long)]
    implant_cooldown_ticks: Option<u32>,
}

impl TunableOverrides {
    fn apply(&self, tunables: &mut Tunables) {
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    tunables.$field = value;
                })*
            };
        }
        apply!(
            battery_capacity_mwh,
            solar_sunlight_w,
            solar_eclipse_w,
            max_battery_draw_w,
            sim_duration_ticks,
            orbit_period_ticks,
            sunlight_window_ticks,
            deposition_w,
            implant_w,
            growth_w,
            deposition_ticks,
            implant_ticks,
            growth_ticks,
            deposition_defect_chance,
            implant_defect_chance,
            growth_defect_chance,
            implant_calibration_ticks,
            implant_calibration_w,
            implant_cooldown_ticks,
        );
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn run(
    jobs_path: &Path,
    out_path: &Path,
    seed: u64,
    config_path: Option<&Path>,
    print_every: u64,
    overrides: &TunableOverrides,
) -> Result<()> {
    let mut tunables = match config_path {
        Some(path) => fab_world::load_tunables(path).context("loading tunables")?,
        None => Tunables::default(),
    };
    overrides.apply(&mut tunables);

    let jobs = fab_world::load_jobs(jobs_path, &tunables).context("loading job roster")?;
    for job in &jobs {
        tracing::debug!(
            id = %job.id,
            deposition = job.phases[0].required_ticks,
            implant = job.phases[1].required_ticks,
            growth = job.phases[2].required_ticks,
            "loaded job"
        );
    }

    let telemetry = Arc::new(
        TelemetryWriter::create(out_path)
            .with_context(|| format!("opening telemetry sink {}", out_path.display()))?,
    );

    println!(
        "Starting run: jobs={} duration={} ticks seed={seed}",
        jobs.len(),
        tunables.sim_duration_ticks,
    );
    println!("{}", "-".repeat(72));

    let config = RunConfig {
        tunables,
        seed,
        progress_every: (print_every > 0).then_some(print_every),
    };
    let summary = fab_runtime::run(jobs, &config, telemetry);

    println!("{}", "-".repeat(72));
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Done after {} ticks: {} completed, {} scrapped, battery {} mWh",
        summary.ticks_run, summary.completed, summary.defective, summary.final_battery_mwh,
    );
    for job in &summary.jobs {
        let status = if job.any_defective() {
            "scrapped"
        } else if job.is_complete() {
            "completed"
        } else {
            "unfinished"
        };
        println!(
            "  {:<8} {:>10}  energy={} W-ticks",
            job.id.0,
            status,
            job.total_energy(),
        );
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fab_runtime=info".parse().unwrap())
                .add_directive("fab_cli=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            jobs,
            out,
            seed,
            config,
            print_every,
            overrides,
        } => run(&jobs, &out, seed, config.as_deref(), print_every, &overrides)?,
    }
    Ok(())
}
