//! Error types for the statistics collector

use thiserror::Error;

/// Result type alias for statistics operations
pub type Result<T> = std::result::Result<T, StatisticsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatisticsError {
    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}
