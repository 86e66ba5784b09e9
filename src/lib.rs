//! `driftmux`: softmax server selection over a drifting latency cluster.
//!
//! Two components, coupled only through a select → observe → update loop:
//!
//! - [`DriftingCluster`]: K synthetic servers whose hidden mean latencies take
//!   a Gaussian random walk every [`tick`](DriftingCluster::tick); each
//!   [`request`](DriftingCluster::request) returns the mean plus fresh noise.
//! - [`SoftmaxSelector`]: Boltzmann exploration over per-server value
//!   estimates, updated with a constant step size so the estimates keep
//!   tracking a moving target.
//!
//! Reward is negative latency: closer to zero is better.
//!
//! **Goals:**
//! - **Deterministic by default**: every component owns a seeded `StdRng`;
//!   same seeds and calls give the same trajectory.
//! - **Non-stationarity friendly**: exponentially weighted estimates, not
//!   lifetime averages.
//! - **Fail fast**: invalid configuration or indices return [`Error`]
//!   immediately; nothing is silently clamped or defaulted.
//!
//! **Pieces:**
//! - [`softmax`] / [`sample_index`]: stable softmax (max-trick) and
//!   inverse-CDF sampling with a last-index fallback.
//! - [`LatencyEnvironment`] / [`SelectionPolicy`]: traits at the seam, so the
//!   harness runs any environment against any policy.
//! - [`TemperatureSchedule`]: optional geometric annealing between steps.
//! - [`run_simulation`] / [`Simulation`]: the driver loop with an oracle
//!   baseline (best true mean per step) and periodic [`Checkpoint`]s.
//!
//! **Non-goals:**
//! - No real network I/O, persistence, or concurrent requests. A
//!   multi-threaded driver must hold an exclusive section per
//!   `request` + `update` pair.
//!
//! # Example
//!
//! ```rust
//! use driftmux::{ClusterConfig, DriftingCluster, SoftmaxConfig, SoftmaxSelector};
//!
//! let cluster_cfg = ClusterConfig::default();
//! let mut cluster = DriftingCluster::new(cluster_cfg)?;
//! let mut selector = SoftmaxSelector::new(SoftmaxConfig::paired_with(&cluster_cfg))?;
//!
//! for _ in 0..1_000 {
//!     cluster.tick();
//!     let server = selector.select();
//!     let latency = cluster.request(server)?;
//!     selector.update(server, -latency)?;
//! }
//! assert_eq!(selector.counts().iter().sum::<u64>(), 1_000);
//! # Ok::<(), driftmux::Error>(())
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::Error;

mod alloc;
pub use alloc::*;

mod cluster;
pub use cluster::*;

mod softmax;
pub use softmax::*;

mod anneal;
pub use anneal::*;

mod policy;
pub use policy::*;

mod harness;
pub use harness::*;
