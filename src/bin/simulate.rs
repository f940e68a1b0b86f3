//! packed-control-simulate: run the reference loop encrypted and in the clear
//!
//! Drives the reference plant with the unencrypted controller and with the
//! encrypted controller, then reports the average control period and the
//! largest actuator deviation between the two runs.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use eyre::{Context, Result};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use packed_control::backend::{LatticeBackend, PlainBackend};
use packed_control::control::{ClosedLoopSystem, Trajectory};
use packed_control::params::{RingParams, ScalingParameters};

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    /// RLWE/RGSW encryption
    Lattice,
    /// Cleartext ring arithmetic, for checking the packing alone
    Plain,
}

#[derive(Parser)]
#[command(name = "packed-control-simulate")]
#[command(about = "Closed-loop simulation with an encrypted linear controller")]
#[command(version)]
struct Args {
    /// JSON file with optional `ring`, `scaling`, `system`, and `steps` fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of control periods
    #[arg(long)]
    steps: Option<usize>,

    /// Ring dimension (overrides the config file)
    #[arg(long)]
    ring_dim: Option<usize>,

    #[arg(long, value_enum, default_value = "lattice")]
    backend: BackendKind,

    /// Random seed for deterministic key generation (optional)
    #[arg(long)]
    seed: Option<u64>,

    /// Write both trajectories as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    ring: Option<RingParams>,
    scaling: Option<ScalingParameters>,
    system: Option<ClosedLoopSystem>,
    steps: Option<usize>,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    plaintext: &'a Trajectory,
    encrypted: &'a Trajectory,
    actuator_deviation: Vec<f64>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config: FileConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let mut ring = config.ring.unwrap_or_default();
    if let Some(ring_dim) = args.ring_dim {
        ring.ring_dim = ring_dim;
    }
    let scaling = config.scaling.unwrap_or_default();
    let system = config.system.unwrap_or_else(ClosedLoopSystem::reference);
    let steps = args.steps.or(config.steps).unwrap_or(1000);

    ring.validate()
        .map_err(|e| eyre::eyre!("Invalid ring parameters: {}", e))?;
    scaling
        .validate()
        .map_err(|e| eyre::eyre!("Invalid scaling parameters: {}", e))?;

    info!("Encrypted control simulation");
    info!("Ring dimension: {}", ring.ring_dim);
    info!(
        "Steps: s = {:e}, r = {:e}, L = {:e}",
        scaling.state_step, scaling.signal_step, scaling.encoding_step
    );
    info!("Control periods: {}", steps);

    let plaintext = system.run_plaintext(steps)?;

    let run_start = Instant::now();
    let encrypted = match args.backend {
        BackendKind::Lattice => {
            let backend = match args.seed {
                Some(seed) => LatticeBackend::with_seed(ring.clone(), seed)?,
                None => LatticeBackend::new(ring.clone())?,
            };
            system.run_encrypted(backend, scaling, steps)?
        }
        BackendKind::Plain => {
            let backend = PlainBackend::new(ring.ring_dim, ring.q)?;
            system.run_encrypted(backend, scaling, steps)?
        }
    };
    info!("Total run time: {:.2?}", run_start.elapsed());

    let deviation = plaintext.actuator_deviation(&encrypted);
    let max_deviation = deviation.iter().copied().fold(0.0, f64::max);

    info!(
        "Average control period: {:.3} ms",
        encrypted.average_latency_ms()
    );
    info!("Max actuator deviation ‖u - u_enc‖₂: {:.3e}", max_deviation);
    if let Some(x) = encrypted.states.last() {
        info!("Final plant state: {:?}", x);
    }

    if let Some(path) = &args.output {
        let report = Report {
            plaintext: &plaintext,
            encrypted: &encrypted,
            actuator_deviation: deviation,
        };
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Trajectories written to {}", path.display());
    }

    Ok(())
}
