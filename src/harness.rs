//! Simulation driver: tick → select → request → update, with an oracle baseline.
//!
//! [`run_simulation`] is generic over [`LatencyEnvironment`] and
//! [`SelectionPolicy`]; [`Simulation`] wires the concrete cluster and softmax
//! selector together from their configs.
//!
//! The oracle baseline is the lowest *true* mean at each step: the latency a
//! policy with perfect knowledge would expect. The reported `gap` is
//! `avg_latency - oracle_avg`, a per-request regret in milliseconds.

use std::fmt;

use tracing::{info, trace};

use crate::anneal::TemperatureSchedule;
use crate::cluster::{ClusterConfig, DriftingCluster};
use crate::error::Error;
use crate::policy::{LatencyEnvironment, SelectionPolicy};
use crate::softmax::{SoftmaxConfig, SoftmaxSelector};

/// Driver parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Number of requests (one per step).
    pub steps: u64,
    /// Record a [`Checkpoint`] every this many steps (`0` disables).
    pub report_every: u64,
    /// Temperature schedule applied after every step.
    pub schedule: TemperatureSchedule,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 50_000,
            report_every: 5_000,
            schedule: TemperatureSchedule::Constant,
        }
    }
}

/// Running averages at one point of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checkpoint {
    pub step: u64,
    pub avg_latency_ms: f64,
    pub oracle_avg_ms: f64,
    pub gap_ms: f64,
    pub temperature: Option<f64>,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationReport {
    pub steps: u64,
    pub servers: usize,
    pub avg_latency_ms: f64,
    pub oracle_avg_ms: f64,
    pub gap_ms: f64,
    /// Per-server selection counts at the end of the run.
    pub counts: Vec<u64>,
    /// Per-server value estimates (`reward = -latency`) at the end of the run.
    pub estimates: Vec<f64>,
    pub temperature: Option<f64>,
    /// True means at the end of the run (after drift).
    pub final_true_means: Vec<f64>,
    pub checkpoints: Vec<Checkpoint>,
}

/// Running totals.
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    latency: f64,
    oracle: f64,
}

impl Totals {
    fn averages(&self, steps: u64) -> (f64, f64) {
        if steps == 0 {
            return (0.0, 0.0);
        }
        let n = steps as f64;
        (self.latency / n, self.oracle / n)
    }
}

/// Run `cfg.steps` request cycles of `policy` against `env`.
///
/// Each step: `env.tick()`, `policy.select()`, `env.request(chosen)`,
/// `policy.update(chosen, -latency)`, then the temperature schedule.
/// Any error from either side aborts the run.
pub fn run_simulation<E, P>(
    env: &mut E,
    policy: &mut P,
    cfg: &SimulationConfig,
) -> Result<SimulationReport, Error>
where
    E: LatencyEnvironment + ?Sized,
    P: SelectionPolicy + ?Sized,
{
    if env.servers() != policy.servers() {
        return Err(Error::ServerCountMismatch {
            environment: env.servers(),
            policy: policy.servers(),
        });
    }
    cfg.schedule.validate()?;

    let mut totals = Totals::default();
    let mut checkpoints = Vec::new();

    for step in 1..=cfg.steps {
        env.tick();

        let chosen = policy.select();
        let latency = env.request(chosen)?;
        policy.update(chosen, -latency)?;

        let best = env.best_mean();
        totals.latency += latency;
        totals.oracle += best;
        trace!(step, chosen, latency, best, "request served");

        if cfg.schedule != TemperatureSchedule::Constant {
            if let Some(tau) = policy.temperature() {
                policy.set_temperature(cfg.schedule.next(tau))?;
            }
        }

        if cfg.report_every > 0 && step % cfg.report_every == 0 {
            let (avg, oracle) = totals.averages(step);
            let cp = Checkpoint {
                step,
                avg_latency_ms: avg,
                oracle_avg_ms: oracle,
                gap_ms: avg - oracle,
                temperature: policy.temperature(),
            };
            info!(
                step,
                avg_latency_ms = cp.avg_latency_ms,
                oracle_avg_ms = cp.oracle_avg_ms,
                gap_ms = cp.gap_ms,
                temperature = ?cp.temperature,
                "checkpoint"
            );
            checkpoints.push(cp);
        }
    }

    let (avg, oracle) = totals.averages(cfg.steps);
    Ok(SimulationReport {
        steps: cfg.steps,
        servers: env.servers(),
        avg_latency_ms: avg,
        oracle_avg_ms: oracle,
        gap_ms: avg - oracle,
        counts: policy.counts(),
        estimates: policy.estimates(),
        temperature: policy.temperature(),
        final_true_means: env.true_means(),
        checkpoints,
    })
}

/// A drifting cluster paired with a softmax selector.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub cluster: DriftingCluster,
    pub selector: SoftmaxSelector,
    pub config: SimulationConfig,
}

impl Simulation {
    /// Build both components, checking that they agree on the server count.
    pub fn from_config(
        cluster: ClusterConfig,
        selector: SoftmaxConfig,
        config: SimulationConfig,
    ) -> Result<Self, Error> {
        if cluster.servers != selector.servers {
            return Err(Error::ServerCountMismatch {
                environment: cluster.servers,
                policy: selector.servers,
            });
        }
        config.schedule.validate()?;
        Ok(Self {
            cluster: DriftingCluster::new(cluster)?,
            selector: SoftmaxSelector::new(selector)?,
            config,
        })
    }

    /// Run the configured number of steps. Calling again continues from the
    /// current state.
    pub fn run(&mut self) -> Result<SimulationReport, Error> {
        run_simulation(&mut self.cluster, &mut self.selector, &self.config)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cp in &self.checkpoints {
            write!(
                f,
                "t={} | avgLatency(ms)={:.2} | oracleAvg(ms)={:.2} | gap(ms)={:.2}",
                cp.step, cp.avg_latency_ms, cp.oracle_avg_ms, cp.gap_ms
            )?;
            match cp.temperature {
                Some(t) => writeln!(f, " | tau={t}")?,
                None => writeln!(f)?,
            }
        }
        writeln!(f)?;
        writeln!(f, "=== FINAL REPORT ===")?;
        writeln!(f, "Total requests: {}", self.steps)?;
        writeln!(f, "K servers: {}", self.servers)?;
        writeln!(f, "Average latency (ms): {:.2}", self.avg_latency_ms)?;
        writeln!(f, "Oracle avg latency (ms): {:.2}", self.oracle_avg_ms)?;
        writeln!(f, "Gap (ms): {:.2}", self.gap_ms)?;
        writeln!(f)?;
        writeln!(f, "Chosen counts per server:")?;
        writeln!(f, "{:?}", self.counts)?;
        writeln!(f)?;
        writeln!(f, "Estimated Q values (reward=-latency):")?;
        writeln!(f, "{:?}", self.estimates)?;
        writeln!(f)?;
        writeln!(f, "Interpretation:")?;
        writeln!(f, "- Higher Q (closer to 0) means lower latency.")?;
        writeln!(
            f,
            "- Under drift, a constant step size alpha > 0 lets the estimates keep up."
        )?;
        write!(
            f,
            "- Larger tau explores more; smaller tau exploits the best estimate."
        )
    }
}
