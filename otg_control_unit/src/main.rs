//! # OTG Control Unit
//!
//! Runs a task file's `[simulation]` scenario through the cycle controller
//! with an ideal plant: every cycle's command is fed back as the next sensor
//! sample. Debug snapshots are written to stdout as JSON lines.

use clap::Parser;
use otg_common::config::LogLevel;
use otg_common::policy::GenerationMode;
use otg_common::samples::{ConstrainedJointsCommand, JointsSample};
use otg_control_unit::config::{LoadedConfig, load_config};
use otg_control_unit::cycle::CycleController;
use otg_control_unit::debug::DebugSnapshot;
use otg_control_unit::engine::{JerkLimitedEngine, OtgEngine};
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// OTG Control Unit: cycle-by-cycle trajectory generation
#[derive(Parser, Debug)]
#[command(name = "otg_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Run an online trajectory generation task against an ideal plant")]
struct Args {
    /// Path to the task TOML.
    #[arg(default_value = "config/task.toml")]
    config: PathBuf,

    /// Override the scenario's cycle limit.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);

    let level = match (&loaded, args.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(cfg), false) => to_level(cfg.task.log_level),
        (Err(_), false) => Level::INFO,
    };
    setup_tracing(level, args.json);

    info!("OTG Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|cfg| run(&args, &cfg));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("OTG Control Unit shutdown complete");
}

fn run(args: &Args, loaded: &LoadedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sim = loaded
        .task
        .simulation
        .as_ref()
        .ok_or("task file has no [simulation] section")?;
    let max_cycles = args.max_cycles.unwrap_or(sim.max_cycles);
    let cycle_time = loaded.cycle_time();
    let names = loaded.constraints.names().to_vec();

    info!(
        "Config OK: cycle_time={}s, joints={}, mode={:?}",
        cycle_time,
        names.len(),
        loaded.settings.mode
    );

    let target = match loaded.settings.mode {
        GenerationMode::Position => {
            let mut target =
                ConstrainedJointsCommand::from_positions(names.iter().cloned(), &sim.target_position);
            for (element, speed) in target.elements.iter_mut().zip(&sim.target_velocity) {
                element.speed = Some(*speed);
            }
            target
        }
        GenerationMode::Velocity => {
            ConstrainedJointsCommand::from_speeds(names.iter().cloned(), &sim.target_velocity)
        }
    };
    let mut sensor = JointsSample::from_positions(names, &sim.initial_position);

    let mut controller = CycleController::new(JerkLimitedEngine::new());
    controller.configure_from(loaded)?;

    let mut finished = false;
    for cycle in 1..=max_cycles {
        let report = controller.tick(&sensor, (cycle == 1).then_some(&target), cycle_time)?;
        let outcome = report.outcome;
        sensor.elements.clone_from(&report.command.elements);

        if outcome.is_final() {
            info!(cycle, "final state reached");
            print_snapshot(&controller)?;
            finished = true;
            break;
        }
        if sim.snapshot_interval > 0 && cycle % sim.snapshot_interval == 0 {
            print_snapshot(&controller)?;
        }
    }
    if !finished {
        warn!(max_cycles, "cycle limit reached before the final state");
    }

    if let Some(stats) = controller.stats() {
        info!(
            "Cycles: {}, avg {} ns, max {} ns, overruns {}",
            stats.cycle_count,
            stats.avg_cycle_ns(),
            stats.max_cycle_ns,
            stats.overruns
        );
    }
    controller.stop();
    Ok(())
}

fn print_snapshot<E: OtgEngine>(
    controller: &CycleController<E>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(telemetry) = controller.telemetry() {
        let snapshot = DebugSnapshot::from_telemetry(&telemetry);
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    Ok(())
}

fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}
