//! # Domain Errors
//!
//! Error types for the ledger.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while appending to or auditing the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A ledger must hold at least one block.
    #[error("Ledger capacity must be greater than zero")]
    ZeroCapacity,

    /// Every slot holds a committed block.
    #[error("Ledger is full ({capacity} blocks)")]
    Full { capacity: usize },

    /// The block does not extend the current head.
    #[error("Block links to {found}, head is {expected}")]
    ChainMismatch { expected: String, found: String },

    /// Audit found a committed block that does not link to its predecessor.
    #[error("Block at slot {index} does not link to slot {}", .index.saturating_sub(1))]
    BrokenLink { index: usize },
}

impl LedgerError {
    /// A full ledger ends the run.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Full { .. } | Self::BrokenLink { .. })
    }
}
