//! Transaction pool error types.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Transaction pool error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A pool must hold at least one slot.
    #[error("Pool capacity must be greater than zero")]
    ZeroCapacity,

    /// Every slot is occupied.
    #[error("Pool is full ({capacity} slots)")]
    Full { capacity: usize },

    /// A transaction with the same id is already pending.
    #[error("Transaction {0} is already in the pool")]
    DuplicateTransaction(String),

    /// No slot became free within the producer's bounded wait.
    #[error("No free slot within {0:?}")]
    Timeout(Duration),

    /// The pool was closed for shutdown.
    #[error("Pool closed")]
    Closed,
}

impl PoolError {
    /// Whether a producer should retry the same publish later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full { .. } | Self::Timeout(_))
    }
}

/// Failure of [`crate::TransactionPool::consume_with`].
#[derive(Debug, Error)]
pub enum ConsumeError<E: std::error::Error + 'static> {
    /// A transaction is no longer among the occupied slots.
    #[error("Transaction {0} is no longer in the pool")]
    Missing(String),

    /// The caller's commit step failed; nothing was released.
    #[error("Commit failed: {0}")]
    Commit(#[source] E),
}
