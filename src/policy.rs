//! Traits for the two sides of the select → observe → update loop.
//!
//! [`DriftingCluster`][crate::DriftingCluster] implements
//! [`LatencyEnvironment`] and [`SoftmaxSelector`][crate::SoftmaxSelector]
//! implements [`SelectionPolicy`]. The harness only talks to these traits, so
//! alternative environments (replayed traces, fixed scenarios) and policies
//! plug into [`run_simulation`][crate::run_simulation] unchanged.
//!
//! The policy side never sees true means; the environment side never sees
//! value estimates.

use crate::error::Error;

/// Something that serves requests with a latency.
///
/// # Example
///
/// ```rust
/// use driftmux::{ClusterConfig, DriftingCluster, LatencyEnvironment};
///
/// fn serve_one<E: LatencyEnvironment>(env: &mut E) -> Result<f64, driftmux::Error> {
///     env.tick();
///     env.request(0)
/// }
///
/// let mut env = DriftingCluster::new(ClusterConfig::default()).unwrap();
/// assert!(serve_one(&mut env).unwrap() >= 1.0);
/// ```
pub trait LatencyEnvironment {
    /// Number of servers.
    fn servers(&self) -> usize;

    /// Advance one simulated step.
    fn tick(&mut self);

    /// Serve one request on `server`, returning the observed latency in ms.
    fn request(&mut self, server: usize) -> Result<f64, Error>;

    /// Hidden per-server means, for oracle baselines only.
    fn true_means(&self) -> Vec<f64>;

    /// Lowest hidden mean: the latency an oracle would expect this step.
    fn best_mean(&self) -> f64 {
        self.true_means().into_iter().fold(f64::INFINITY, f64::min)
    }
}

/// Stateful server-selection policy.
pub trait SelectionPolicy {
    /// Number of servers.
    fn servers(&self) -> usize;

    /// Choose a server in `[0, servers)`.
    fn select(&mut self) -> usize;

    /// Learn from a scalar reward for `server` (higher is better).
    fn update(&mut self, server: usize, reward: f64) -> Result<(), Error>;

    /// Per-server value estimates (owned copy).
    fn estimates(&self) -> Vec<f64>;

    /// Per-server selection counts (owned copy).
    fn counts(&self) -> Vec<u64>;

    /// Exploration temperature, if the policy has one.
    fn temperature(&self) -> Option<f64> {
        None
    }

    /// Replace the exploration temperature. Policies without one ignore it.
    fn set_temperature(&mut self, _temperature: f64) -> Result<(), Error> {
        Ok(())
    }
}

impl LatencyEnvironment for crate::DriftingCluster {
    fn servers(&self) -> usize {
        self.servers()
    }
    fn tick(&mut self) {
        self.tick();
    }
    fn request(&mut self, server: usize) -> Result<f64, Error> {
        self.request(server)
    }
    fn true_means(&self) -> Vec<f64> {
        self.true_means()
    }
    fn best_mean(&self) -> f64 {
        self.best_mean()
    }
}

impl SelectionPolicy for crate::SoftmaxSelector {
    fn servers(&self) -> usize {
        self.servers()
    }
    fn select(&mut self) -> usize {
        self.select()
    }
    fn update(&mut self, server: usize, reward: f64) -> Result<(), Error> {
        self.update(server, reward)
    }
    fn estimates(&self) -> Vec<f64> {
        self.q_values()
    }
    fn counts(&self) -> Vec<u64> {
        self.counts()
    }
    fn temperature(&self) -> Option<f64> {
        Some(self.temperature())
    }
    fn set_temperature(&mut self, temperature: f64) -> Result<(), Error> {
        self.set_temperature(temperature)
    }
}
