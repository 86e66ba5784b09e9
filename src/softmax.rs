//! Softmax (Boltzmann) server selection with a constant-step-size estimator.
//!
//! The selector keeps one value estimate `q[i]` per server and picks servers
//! with probability proportional to `exp(q[i] / temperature)` (computed with
//! the max-trick, see [`softmax`]). After each request the chosen server's
//! estimate moves toward the observed reward:
//!
//! ```text
//!   q[i] <- q[i] + alpha * (reward - q[i])
//! ```
//!
//! A fixed `alpha` (rather than a `1/n` sample average) keeps an exponentially
//! weighted estimate that can follow drifting latencies.
//!
//! Notes:
//! - The selector is **seedable**; its RNG is independent of the cluster's.
//! - No annealing happens internally. Use [`SoftmaxSelector::set_temperature`]
//!   (or [`TemperatureSchedule`][crate::TemperatureSchedule]) between steps.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::alloc::{sample_index, softmax};
use crate::cluster::ClusterConfig;
use crate::error::{check_server, Error};

/// Configuration for [`SoftmaxSelector`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftmaxConfig {
    /// Number of servers (must be > 0).
    pub servers: usize,
    /// Starting estimate for every server. With `reward = -latency`, a value
    /// like `-100.0` is a deliberately pessimistic prior.
    pub initial_q: f64,
    /// Initial temperature (finite, > 0). Higher explores more.
    pub temperature: f64,
    /// Constant step size in `(0, 1]`.
    pub alpha: f64,
    /// Seed for the selector's RNG.
    pub seed: u64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            servers: 8,
            initial_q: -100.0,
            temperature: 10.0,
            alpha: 0.05,
            seed: 43,
        }
    }
}

impl SoftmaxConfig {
    /// Default selector parameters sized for `cluster`, seeded with
    /// `cluster.seed + 1` so the two streams stay independent.
    pub fn paired_with(cluster: &ClusterConfig) -> Self {
        Self {
            servers: cluster.servers,
            seed: cluster.seed.wrapping_add(1),
            ..Self::default()
        }
    }

    /// Check every parameter without building anything.
    pub fn validate(&self) -> Result<(), Error> {
        if self.servers == 0 {
            return Err(Error::NoServers);
        }
        validate_temperature(self.temperature)?;
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidStepSize(self.alpha));
        }
        if !self.initial_q.is_finite() {
            return Err(Error::NonFinite("initial_q"));
        }
        Ok(())
    }
}

fn validate_temperature(t: f64) -> Result<(), Error> {
    if t.is_finite() && t > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTemperature(t))
    }
}

/// Seedable softmax selector.
#[derive(Debug, Clone)]
pub struct SoftmaxSelector {
    // Per-server state, both sized once at construction.
    q: Vec<f64>,
    counts: Vec<u64>,
    temperature: f64,
    alpha: f64,
    rng: StdRng,
}

impl SoftmaxSelector {
    /// Create a selector with every estimate at `cfg.initial_q` and every
    /// count at zero.
    pub fn new(cfg: SoftmaxConfig) -> Result<Self, Error> {
        cfg.validate()?;
        debug!(
            servers = cfg.servers,
            initial_q = cfg.initial_q,
            temperature = cfg.temperature,
            alpha = cfg.alpha,
            seed = cfg.seed,
            "softmax selector initialized"
        );
        Ok(Self {
            q: vec![cfg.initial_q; cfg.servers],
            counts: vec![0; cfg.servers],
            temperature: cfg.temperature,
            alpha: cfg.alpha,
            rng: StdRng::seed_from_u64(cfg.seed),
        })
    }

    /// Number of servers.
    pub fn servers(&self) -> usize {
        self.q.len()
    }

    /// Current selection distribution. Consumes no randomness.
    pub fn probabilities(&self) -> Vec<f64> {
        softmax(&self.q, self.temperature)
    }

    /// Pick a server by sampling the softmax distribution over `q`.
    ///
    /// Always returns an index in `[0, servers)`.
    pub fn select(&mut self) -> usize {
        self.select_with_probs().0
    }

    /// Pick a server and return the distribution it was sampled from.
    pub fn select_with_probs(&mut self) -> (usize, Vec<f64>) {
        let probs = self.probabilities();
        // `q` is sized > 0 at construction, so the draw always lands.
        let chosen = sample_index(&mut self.rng, &probs).unwrap_or(0);
        (chosen, probs)
    }

    /// Record `reward` for `server`: bump its count and move its estimate
    /// by `alpha * (reward - q)`.
    ///
    /// A non-finite `reward` is rejected and leaves all state untouched.
    pub fn update(&mut self, server: usize, reward: f64) -> Result<(), Error> {
        check_server(server, self.servers())?;
        if !reward.is_finite() {
            return Err(Error::NonFinite("reward"));
        }
        self.counts[server] = self.counts[server].saturating_add(1);
        let q = &mut self.q[server];
        *q += self.alpha * (reward - *q);
        Ok(())
    }

    /// Copy of the current estimates.
    pub fn q_values(&self) -> Vec<f64> {
        self.q.clone()
    }

    /// Copy of the per-server selection counts.
    pub fn counts(&self) -> Vec<u64> {
        self.counts.clone()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Constant step size, fixed for the selector's lifetime.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Replace the temperature (finite, > 0). On error the old value is kept.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), Error> {
        validate_temperature(temperature)?;
        if temperature != self.temperature {
            debug!(from = self.temperature, to = temperature, "temperature changed");
        }
        self.temperature = temperature;
        Ok(())
    }
}
