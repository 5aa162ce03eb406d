//! Configuration types for the miner pool

use std::time::Duration;

use ac_02_proof_of_work::DEFAULT_MAX_OPERATIONS;
use serde::Deserialize;

use crate::error::{MiningError, Result};

/// Runtime configuration for the miner pool
#[derive(Clone, Debug, Deserialize)]
pub struct MinerConfig {
    /// Number of concurrent miner workers
    pub num_miners: usize,

    /// Transactions in every block
    pub transactions_per_block: usize,

    /// Nonce cap per proof-of-work attempt
    pub pow_max_operations: u64,

    /// Fallback wake-up when no broadcast arrives
    pub recheck_interval: Duration,

    /// Delay before retrying a failed transport write
    pub retry_interval: Duration,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            num_miners: 2,
            transactions_per_block: 3,
            pow_max_operations: DEFAULT_MAX_OPERATIONS,
            recheck_interval: Duration::from_millis(500),
            retry_interval: Duration::from_millis(100),
        }
    }
}

impl MinerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_miners == 0 {
            return Err(MiningError::NoMiners);
        }
        if self.transactions_per_block == 0 {
            return Err(MiningError::EmptyBlocks);
        }
        Ok(())
    }
}
