//! Error types for the autoscaling controller

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Configuration errors rejected before the loop starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("Controller interval must be greater than zero")]
    ZeroInterval,

    #[error("Transactions per block must be greater than zero")]
    ZeroBlockSize,

    /// Thresholds must satisfy `low <= one_auxiliary <= two_auxiliaries <= 100`
    #[error("Invalid scale thresholds: low={low}%, one auxiliary={one}%, two auxiliaries={two}%")]
    InvalidThresholds { low: u8, one: u8, two: u8 },
}
