//! Softmax routing against a drifting synthetic cluster.
//!
//! Run:
//! `cargo run --example drift_sim -- --steps 50000 --anneal-decay 0.99999`
//!
//! Set `RUST_LOG=driftmux=info` to see checkpoints as they are recorded.

use clap::Parser;
use driftmux::{
    ClusterConfig, Simulation, SimulationConfig, SoftmaxConfig, TemperatureSchedule,
};
use tracing_subscriber::EnvFilter;

/// Command-line overrides for the default experiment.
#[derive(Parser, Debug)]
#[command(name = "drift_sim")]
struct Cli {
    /// Number of servers.
    #[arg(long, default_value_t = 8)]
    servers: usize,
    /// Number of requests (one per step).
    #[arg(long, default_value_t = 50_000)]
    steps: u64,
    /// Checkpoint interval.
    #[arg(long, default_value_t = 5_000)]
    report_every: u64,
    /// Cluster seed; the selector uses `seed + 1`.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 30.0)]
    base_min_ms: f64,
    #[arg(long, default_value_t = 220.0)]
    base_max_ms: f64,
    #[arg(long, default_value_t = 25.0)]
    noise_std_ms: f64,
    #[arg(long, default_value_t = 0.03)]
    drift_std_ms: f64,
    /// Starting estimate for every server (reward = -latency).
    #[arg(long, default_value_t = -100.0, allow_hyphen_values = true)]
    initial_q: f64,
    #[arg(long, default_value_t = 10.0)]
    temperature: f64,
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,
    /// Geometric temperature decay per step (omit for a constant temperature).
    #[arg(long)]
    anneal_decay: Option<f64>,
    /// Lower bound for the annealed temperature.
    #[arg(long, default_value_t = 0.5)]
    anneal_floor: f64,
}

fn main() -> Result<(), driftmux::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let cluster = ClusterConfig {
        servers: cli.servers,
        base_min_ms: cli.base_min_ms,
        base_max_ms: cli.base_max_ms,
        noise_std_ms: cli.noise_std_ms,
        drift_std_ms: cli.drift_std_ms,
        seed: cli.seed,
    };
    let selector = SoftmaxConfig {
        initial_q: cli.initial_q,
        temperature: cli.temperature,
        alpha: cli.alpha,
        ..SoftmaxConfig::paired_with(&cluster)
    };
    let schedule = match cli.anneal_decay {
        Some(decay) => TemperatureSchedule::Geometric {
            decay,
            floor: cli.anneal_floor,
        },
        None => TemperatureSchedule::Constant,
    };
    let config = SimulationConfig {
        steps: cli.steps,
        report_every: cli.report_every,
        schedule,
    };

    let mut sim = Simulation::from_config(cluster, selector, config)?;
    let report = sim.run()?;
    println!("{report}");
    println!();
    println!("True means at end of run (ms):");
    println!("{:?}", report.final_true_means);
    Ok(())
}
