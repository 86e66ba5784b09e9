//! Temperature annealing schedules.
//!
//! The selector never decays its own temperature. A driver that wants less
//! exploration over time applies a schedule between steps.

use crate::error::Error;

/// How the temperature evolves after each step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemperatureSchedule {
    /// Keep the temperature fixed.
    #[default]
    Constant,
    /// `tau <- max(floor, tau * decay)` after every step.
    ///
    /// `decay` must be in `(0, 1]`; `floor` must be finite and > 0.
    Geometric { decay: f64, floor: f64 },
}

impl TemperatureSchedule {
    /// Check the schedule parameters.
    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            Self::Constant => Ok(()),
            Self::Geometric { decay, floor } => {
                if !(decay > 0.0 && decay <= 1.0) {
                    return Err(Error::Schedule("decay must be in (0, 1]"));
                }
                if !(floor.is_finite() && floor > 0.0) {
                    return Err(Error::Schedule("floor must be finite and > 0"));
                }
                Ok(())
            }
        }
    }

    /// Temperature for the next step, given the current one.
    pub fn next(&self, tau: f64) -> f64 {
        match *self {
            Self::Constant => tau,
            Self::Geometric { decay, floor } => (tau * decay).max(floor),
        }
    }
}
