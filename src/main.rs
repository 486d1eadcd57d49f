//! Pedometer Engine
//!
//! Replays a synthetic walk through a scripted sensor and a step counting
//! session, then prints the resulting count. Useful for checking a tuning
//! file and a store location before wiring the engine into a host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pedometer::{
    synthetic_walk, AlwaysGranted, Availability, EngineConfig, ScriptedSensor, StepCounter,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const MAX_STEPS: u64 = 1_000_000;
const MAX_CADENCE_MS: u64 = 60_000;
const MAX_SAMPLES: u64 = 10_000_000;

/// pedometer - replay a walk through the step detector
#[derive(Parser, Debug)]
#[command(name = "pedometer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to an engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Persist the count in this JSON file (overrides the config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Number of steps in the synthetic walk
    #[arg(
        long,
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(0..=MAX_STEPS)
    )]
    steps: u64,

    /// Milliseconds between steps
    #[arg(
        long,
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..=MAX_CADENCE_MS)
    )]
    cadence_ms: u64,

    /// Zero the persisted count before walking
    #[arg(long)]
    reset: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store.path = Some(store);
    }

    let interval_ms = config.sensor.update_interval_ms;
    let samples = (cli.steps * cli.cadence_ms) / interval_ms.max(1);
    if samples > MAX_SAMPLES {
        anyhow::bail!("walk of {samples} samples is too long (limit {MAX_SAMPLES})");
    }

    let sensor = ScriptedSensor::available();
    let mut counter = StepCounter::from_config(sensor.clone(), AlwaysGranted, &config)
        .context("opening count store")?;
    let restored = counter.current_count();

    if cli.reset {
        counter.reset();
    }

    if counter.check_availability() != Availability::Available {
        anyhow::bail!("motion sensor is not available");
    }
    counter.try_start().context("starting step counter")?;

    let walk = synthetic_walk(0, cli.steps, cli.cadence_ms, interval_ms);
    tracing::info!(
        samples = walk.len(),
        cadence_ms = cli.cadence_ms,
        threshold = config.detector.threshold,
        debounce_window_ms = config.detector.debounce_window_ms,
        "replaying walk"
    );
    sensor.emit_all(walk);
    counter.stop();

    println!("Restored count: {restored}");
    println!("Steps walked:   {}", cli.steps);
    println!("Current count:  {}", counter.current_count());

    Ok(())
}
