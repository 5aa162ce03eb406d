//! # Scale Policy
//!
//! Pure mapping from pool occupancy and the current validator count to the
//! desired validator count.
//!
//! | Occupancy | Desired validators |
//! |-----------|--------------------|
//! | `< low` (40 %) | 1 (base only) |
//! | `low ..< one_auxiliary` (40–60 %) | unchanged |
//! | `one_auxiliary ..< two_auxiliaries` (60–80 %) | at least 2 |
//! | `≥ two_auxiliaries` (80 %) | 3 |
//!
//! The unchanged band is the hysteresis: a pool hovering around one threshold
//! does not flap between sizes.

use serde::Deserialize;

use crate::error::{ControllerError, Result};

const MIN_WORKERS: usize = 1;
const MAX_WORKERS: usize = 3;

/// Occupancy thresholds, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ScalePolicy {
    pub low: u8,
    pub one_auxiliary: u8,
    pub two_auxiliaries: u8,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            low: 40,
            one_auxiliary: 60,
            two_auxiliaries: 80,
        }
    }
}

impl ScalePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.low <= self.one_auxiliary
            && self.one_auxiliary <= self.two_auxiliaries
            && self.two_auxiliaries <= 100
        {
            Ok(())
        } else {
            Err(ControllerError::InvalidThresholds {
                low: self.low,
                one: self.one_auxiliary,
                two: self.two_auxiliaries,
            })
        }
    }

    /// Desired validator count for `occupancy_percent`, given `current`.
    pub fn desired(&self, occupancy_percent: f64, current: usize) -> usize {
        let current = current.clamp(MIN_WORKERS, MAX_WORKERS);
        if occupancy_percent < f64::from(self.low) {
            MIN_WORKERS
        } else if occupancy_percent >= f64::from(self.two_auxiliaries) {
            MAX_WORKERS
        } else if occupancy_percent >= f64::from(self.one_auxiliary) {
            current.max(2)
        } else {
            current
        }
    }
}
