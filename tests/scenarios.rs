//! End-to-end scenarios for the cluster + selector loop.

use driftmux::{
    run_simulation, ClusterConfig, DriftingCluster, Error, LatencyEnvironment, SimulationConfig,
    SoftmaxConfig, SoftmaxSelector, TemperatureSchedule,
};

/// Two noiseless servers whose latencies swap at `switch_at`.
struct SwitchingPair {
    step: u64,
    switch_at: u64,
}

impl SwitchingPair {
    fn means_at(&self, step: u64) -> [f64; 2] {
        if step < self.switch_at {
            [50.0, 150.0]
        } else {
            [150.0, 50.0]
        }
    }
}

impl LatencyEnvironment for SwitchingPair {
    fn servers(&self) -> usize {
        2
    }
    fn tick(&mut self) {
        self.step += 1;
    }
    fn request(&mut self, server: usize) -> Result<f64, Error> {
        self.means_at(self.step)
            .get(server)
            .copied()
            .ok_or(Error::ServerOutOfRange { index: server, servers: 2 })
    }
    fn true_means(&self) -> Vec<f64> {
        self.means_at(self.step).to_vec()
    }
}

fn chi_square(counts: &[u64]) -> f64 {
    let n: u64 = counts.iter().sum();
    let expected = n as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

#[test]
fn reference_update_scenario() {
    let mut s = SoftmaxSelector::new(SoftmaxConfig {
        servers: 2,
        initial_q: -100.0,
        temperature: 10.0,
        alpha: 0.5,
        seed: 0,
    })
    .unwrap();
    s.update(0, -50.0).unwrap();
    assert_eq!(s.q_values(), vec![-75.0, -100.0]);
    assert_eq!(s.counts(), vec![1, 0]);
}

#[test]
fn equal_estimates_select_uniformly() {
    // df = 3; P(chi2 > 25) is about 1.6e-5.
    for (seed, temperature) in [(1u64, 1e-3), (2, 0.5), (3, 10.0), (4, 1e4)] {
        let mut s = SoftmaxSelector::new(SoftmaxConfig {
            servers: 4,
            initial_q: -120.0,
            temperature,
            alpha: 0.1,
            seed,
        })
        .unwrap();
        let mut counts = [0u64; 4];
        for _ in 0..20_000 {
            counts[s.select()] += 1;
        }
        let stat = chi_square(&counts);
        assert!(stat < 25.0, "tau={temperature} counts={counts:?} chi2={stat}");
    }
}

#[test]
fn noiseless_static_cluster_is_deterministic() {
    let mut c = DriftingCluster::new(ClusterConfig {
        servers: 5,
        noise_std_ms: 0.0,
        drift_std_ms: 0.0,
        ..ClusterConfig::default()
    })
    .unwrap();
    let means = c.true_means();
    for _ in 0..100 {
        c.tick();
        for (i, m) in means.iter().enumerate() {
            assert_eq!(c.request(i).unwrap(), m.max(1.0));
        }
    }
    assert_eq!(c.true_means(), means);
}

#[test]
fn inverted_latency_range_fails_at_construction() {
    let err = DriftingCluster::new(ClusterConfig {
        base_min_ms: 220.0,
        base_max_ms: 30.0,
        ..ClusterConfig::default()
    })
    .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidLatencyRange {
            min: 220.0,
            max: 30.0
        }
    );
}

#[test]
fn constant_step_size_tracks_a_switch() {
    let mut env = SwitchingPair {
        step: 0,
        switch_at: 4_000,
    };
    let mut s = SoftmaxSelector::new(SoftmaxConfig {
        servers: 2,
        ..SoftmaxConfig::default()
    })
    .unwrap();

    let phase = |steps| SimulationConfig {
        steps,
        report_every: 0,
        schedule: TemperatureSchedule::Constant,
    };

    // Steps 1..4000: server 0 is faster.
    let early = run_simulation(&mut env, &mut s, &phase(3_999)).unwrap();
    assert!(early.counts[0] > 3_500, "counts={:?}", early.counts);

    // Adaptation window after the swap.
    run_simulation(&mut env, &mut s, &phase(2_000)).unwrap();

    // Well after the swap, server 1 dominates.
    let c0 = s.counts();
    run_simulation(&mut env, &mut s, &phase(2_000)).unwrap();
    let c1 = s.counts();
    let recent_1 = c1[1] - c0[1];
    assert!(recent_1 > 1_900, "recent picks of server 1: {recent_1}");
    assert!(s.q_values()[1] > s.q_values()[0]);
}

#[test]
fn selector_never_reads_true_means() {
    // Two identical environments, one with scrambled oracle output: the
    // selector's trajectory must not change.
    struct Scrambled(DriftingCluster);
    impl LatencyEnvironment for Scrambled {
        fn servers(&self) -> usize {
            self.0.servers()
        }
        fn tick(&mut self) {
            self.0.tick();
        }
        fn request(&mut self, server: usize) -> Result<f64, Error> {
            self.0.request(server)
        }
        fn true_means(&self) -> Vec<f64> {
            vec![1.0e9; self.0.servers()]
        }
    }

    let cfg = SimulationConfig {
        steps: 3_000,
        report_every: 0,
        schedule: TemperatureSchedule::Constant,
    };
    let cc = ClusterConfig::default();

    let mut a_env = DriftingCluster::new(cc).unwrap();
    let mut a = SoftmaxSelector::new(SoftmaxConfig::paired_with(&cc)).unwrap();
    let ra = run_simulation(&mut a_env, &mut a, &cfg).unwrap();

    let mut b_env = Scrambled(DriftingCluster::new(cc).unwrap());
    let mut b = SoftmaxSelector::new(SoftmaxConfig::paired_with(&cc)).unwrap();
    let rb = run_simulation(&mut b_env, &mut b, &cfg).unwrap();

    assert_eq!(ra.counts, rb.counts);
    assert_eq!(ra.estimates, rb.estimates);
    assert_eq!(ra.avg_latency_ms, rb.avg_latency_ms);
    assert_ne!(ra.oracle_avg_ms, rb.oracle_avg_ms);
}
