//! Error types for the miner pool

use thiserror::Error;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, MiningError>;

/// Errors raised while configuring or starting miners
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// At least one miner is required
    #[error("Number of miners must be greater than zero")]
    NoMiners,

    /// Blocks must carry at least one transaction
    #[error("Transactions per block must be greater than zero")]
    EmptyBlocks,

    /// Blocks could never be assembled from the pool
    #[error("Transactions per block ({per_block}) exceeds pool capacity ({capacity})")]
    BlockLargerThanPool { per_block: usize, capacity: usize },

    /// The transport was built for a different block size
    #[error("Transport expects {transport} transactions per block, miners use {miners}")]
    TransportMismatch { transport: usize, miners: usize },
}
