//! Synthetic K-server cluster whose mean latencies drift over time.
//!
//! Each server has a hidden "true" mean latency. Every [`DriftingCluster::tick`]
//! moves each mean by an independent Gaussian step (a random walk), and every
//! [`DriftingCluster::request`] returns the current mean plus fresh Gaussian
//! noise. Both are floor-clamped at [`LATENCY_FLOOR_MS`].
//!
//! Notes:
//! - The cluster is **seedable** and owns its RNG; it never shares a stream
//!   with the selector.
//! - A selector must never read [`DriftingCluster::true_means`]; that view
//!   exists for oracle baselines and reports.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::{check_server, Error};

/// Lower bound on any mean or observed latency (ms).
pub const LATENCY_FLOOR_MS: f64 = 1.0;

/// Configuration for [`DriftingCluster`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterConfig {
    /// Number of servers (must be > 0).
    pub servers: usize,
    /// Lower bound of the initial mean latency draw (ms, > 0).
    pub base_min_ms: f64,
    /// Upper bound of the initial mean latency draw (ms, >= `base_min_ms`).
    pub base_max_ms: f64,
    /// Per-request observation noise std (ms, >= 0).
    pub noise_std_ms: f64,
    /// Per-tick random-walk std on each mean (ms, >= 0). `0` disables drift.
    pub drift_std_ms: f64,
    /// Seed for the cluster's RNG.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            servers: 8,
            base_min_ms: 30.0,
            base_max_ms: 220.0,
            noise_std_ms: 25.0,
            drift_std_ms: 0.03,
            seed: 42,
        }
    }
}

impl ClusterConfig {
    /// Check every parameter without building anything.
    pub fn validate(&self) -> Result<(), Error> {
        if self.servers == 0 {
            return Err(Error::NoServers);
        }
        let (min, max) = (self.base_min_ms, self.base_max_ms);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || max <= 0.0 || max < min {
            return Err(Error::InvalidLatencyRange { min, max });
        }
        for (name, value) in [
            ("noise_std_ms", self.noise_std_ms),
            ("drift_std_ms", self.drift_std_ms),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(Error::NegativeStd { name, value });
            }
            if !value.is_finite() {
                return Err(Error::NonFinite(name));
            }
        }
        Ok(())
    }
}

/// Drifting latency environment.
#[derive(Debug, Clone)]
pub struct DriftingCluster {
    true_means: Vec<f64>,
    noise: Normal<f64>,
    drift: Normal<f64>,
    drift_std_ms: f64,
    rng: StdRng,
}

impl DriftingCluster {
    /// Build a cluster, drawing each initial mean uniformly from
    /// `[base_min_ms, base_max_ms]`.
    ///
    /// Fails before any state is created if the config is invalid.
    pub fn new(cfg: ClusterConfig) -> Result<Self, Error> {
        cfg.validate()?;
        let noise = Normal::new(0.0, cfg.noise_std_ms)
            .map_err(|_| Error::NonFinite("noise_std_ms"))?;
        let drift = Normal::new(0.0, cfg.drift_std_ms)
            .map_err(|_| Error::NonFinite("drift_std_ms"))?;

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let span = cfg.base_max_ms - cfg.base_min_ms;
        let true_means: Vec<f64> = (0..cfg.servers)
            .map(|_| cfg.base_min_ms + rng.random::<f64>() * span)
            .collect();

        debug!(
            servers = cfg.servers,
            noise_std_ms = cfg.noise_std_ms,
            drift_std_ms = cfg.drift_std_ms,
            seed = cfg.seed,
            "drifting cluster initialized"
        );

        Ok(Self {
            true_means,
            noise,
            drift,
            drift_std_ms: cfg.drift_std_ms,
            rng,
        })
    }

    /// Number of servers.
    pub fn servers(&self) -> usize {
        self.true_means.len()
    }

    /// Advance time by one step: every mean takes one random-walk step.
    ///
    /// Call exactly once per simulated step, before serving that step's
    /// requests. No-op (and no RNG draws) when drift is disabled.
    pub fn tick(&mut self) {
        if self.drift_std_ms == 0.0 {
            return;
        }
        for m in &mut self.true_means {
            *m += self.drift.sample(&mut self.rng);
            if *m < LATENCY_FLOOR_MS {
                *m = LATENCY_FLOOR_MS;
            }
        }
    }

    /// Serve one request on `server` and return the observed latency (ms).
    ///
    /// Every call draws fresh noise, including repeated calls within a tick.
    pub fn request(&mut self, server: usize) -> Result<f64, Error> {
        check_server(server, self.servers())?;
        let observed = self.true_means[server] + self.noise.sample(&mut self.rng);
        Ok(observed.max(LATENCY_FLOOR_MS))
    }

    /// Copy of the current true means. Oracle/reporting use only.
    pub fn true_means(&self) -> Vec<f64> {
        self.true_means.clone()
    }

    /// Index of the server with the lowest true mean (lowest index on ties).
    pub fn best_server(&self) -> usize {
        let mut best = 0;
        for (i, &m) in self.true_means.iter().enumerate().skip(1) {
            if m < self.true_means[best] {
                best = i;
            }
        }
        best
    }

    /// Lowest true mean across servers.
    pub fn best_mean(&self) -> f64 {
        self.true_means[self.best_server()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(servers: usize) -> ClusterConfig {
        ClusterConfig {
            servers,
            ..ClusterConfig::default()
        }
    }

    #[test]
    fn initial_means_are_inside_base_range() {
        let c = DriftingCluster::new(cfg(64)).unwrap();
        for m in c.true_means() {
            assert!((30.0..=220.0).contains(&m), "m={m}");
        }
    }

    #[test]
    fn rejects_invalid_configs() {
        assert_eq!(DriftingCluster::new(cfg(0)).unwrap_err(), Error::NoServers);

        let bad_range = ClusterConfig {
            base_min_ms: 100.0,
            base_max_ms: 50.0,
            ..cfg(2)
        };
        assert!(matches!(
            DriftingCluster::new(bad_range),
            Err(Error::InvalidLatencyRange { .. })
        ));

        let zero_min = ClusterConfig {
            base_min_ms: 0.0,
            ..cfg(2)
        };
        assert!(DriftingCluster::new(zero_min).is_err());

        let neg_noise = ClusterConfig {
            noise_std_ms: -1.0,
            ..cfg(2)
        };
        assert!(matches!(
            DriftingCluster::new(neg_noise),
            Err(Error::NegativeStd {
                name: "noise_std_ms",
                ..
            })
        ));

        let neg_drift = ClusterConfig {
            drift_std_ms: -0.1,
            ..cfg(2)
        };
        assert!(DriftingCluster::new(neg_drift).is_err());
    }

    #[test]
    fn degenerate_range_is_allowed() {
        let c = DriftingCluster::new(ClusterConfig {
            base_min_ms: 50.0,
            base_max_ms: 50.0,
            ..cfg(3)
        })
        .unwrap();
        assert_eq!(c.true_means(), vec![50.0; 3]);
    }

    #[test]
    fn tick_without_drift_is_exact_noop() {
        let mut c = DriftingCluster::new(ClusterConfig {
            drift_std_ms: 0.0,
            ..cfg(5)
        })
        .unwrap();
        let before = c.true_means();
        for _ in 0..1000 {
            c.tick();
        }
        assert_eq!(before, c.true_means());
    }

    #[test]
    fn heavy_drift_never_goes_below_floor() {
        let mut c = DriftingCluster::new(ClusterConfig {
            base_min_ms: 1.0,
            base_max_ms: 5.0,
            drift_std_ms: 50.0,
            ..cfg(4)
        })
        .unwrap();
        for _ in 0..5_000 {
            c.tick();
            assert!(c.true_means().iter().all(|&m| m >= LATENCY_FLOOR_MS));
        }
    }

    #[test]
    fn noiseless_request_returns_mean() {
        let mut c = DriftingCluster::new(ClusterConfig {
            noise_std_ms: 0.0,
            drift_std_ms: 0.0,
            ..cfg(3)
        })
        .unwrap();
        let means = c.true_means();
        for _ in 0..10 {
            for (i, &m) in means.iter().enumerate() {
                assert_eq!(c.request(i).unwrap(), m.max(LATENCY_FLOOR_MS));
            }
        }
    }

    #[test]
    fn request_out_of_range_fails() {
        let mut c = DriftingCluster::new(cfg(2)).unwrap();
        assert_eq!(
            c.request(2),
            Err(Error::ServerOutOfRange {
                index: 2,
                servers: 2
            })
        );
    }

    #[test]
    fn snapshot_is_a_copy() {
        let c = DriftingCluster::new(cfg(3)).unwrap();
        let mut snap = c.true_means();
        snap[0] = -1.0;
        assert_ne!(c.true_means()[0], -1.0);
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = DriftingCluster::new(cfg(4)).unwrap();
        let mut b = DriftingCluster::new(cfg(4)).unwrap();
        for step in 0..200 {
            a.tick();
            b.tick();
            let i = step % 4;
            assert_eq!(a.request(i).unwrap(), b.request(i).unwrap());
        }
        assert_eq!(a.true_means(), b.true_means());
    }

    #[test]
    fn best_server_is_argmin() {
        let c = DriftingCluster::new(cfg(8)).unwrap();
        let means = c.true_means();
        let best = c.best_server();
        assert!(means.iter().all(|&m| m >= means[best]));
        assert_eq!(c.best_mean(), means[best]);
    }
}
