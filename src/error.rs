//! Error type shared by the cluster, the selector, and the harness.
//!
//! Every variant is a precondition violation on the caller's side. Nothing in
//! this crate retries or substitutes defaults after an error.

use thiserror::Error;

/// Invalid configuration or call-time argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("server count must be > 0")]
    NoServers,
    #[error("invalid base latency range [{min}, {max}]: bounds must be > 0 and max >= min")]
    InvalidLatencyRange { min: f64, max: f64 },
    #[error("{name} must be >= 0 (got {value})")]
    NegativeStd { name: &'static str, value: f64 },
    #[error("temperature must be finite and > 0 (got {0})")]
    InvalidTemperature(f64),
    #[error("step size alpha must be in (0, 1] (got {0})")]
    InvalidStepSize(f64),
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    #[error("server index {index} out of range for {servers} servers")]
    ServerOutOfRange { index: usize, servers: usize },
    #[error("annealing schedule: {0}")]
    Schedule(&'static str),
    #[error("environment has {environment} servers but policy has {policy}")]
    ServerCountMismatch { environment: usize, policy: usize },
}

/// Check `index < servers`.
pub(crate) fn check_server(index: usize, servers: usize) -> Result<(), Error> {
    if index < servers {
        Ok(())
    } else {
        Err(Error::ServerOutOfRange { index, servers })
    }
}
