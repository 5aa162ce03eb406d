//! Error and rejection types for the validator pool.
//!
//! A [`Rejection`] is a normal validation result and is reported to the
//! statistics collector. A [`ValidationError`] is an infrastructure failure
//! around the validation itself.

use std::fmt;

use ac_02_proof_of_work::PowError;
use ac_03_ledger::LedgerError;
use ac_04_block_transport::TransportError;
use thiserror::Error;

/// Result type alias for validator operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Why a block was not committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The recomputed digest differs from the claim or misses the difficulty.
    InvalidProof(PowError),
    /// The block does not extend the current head.
    ChainMismatch { expected: String, found: String },
    /// A transaction is no longer pending (already committed elsewhere).
    StaleTransaction(String),
    /// The block lists the same transaction more than once.
    DuplicateTransaction(String),
    /// No ledger slot is left.
    LedgerFull,
}

impl Rejection {
    /// Short label used in logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProof(_) => "invalid_proof",
            Self::ChainMismatch { .. } => "chain_mismatch",
            Self::StaleTransaction(_) => "stale_transaction",
            Self::DuplicateTransaction(_) => "duplicate_transaction",
            Self::LedgerFull => "ledger_full",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProof(e) => write!(f, "invalid proof: {e}"),
            Self::ChainMismatch { expected, found } => {
                write!(f, "links to {found}, head is {expected}")
            }
            Self::StaleTransaction(id) => write!(f, "transaction {id} is no longer pending"),
            Self::DuplicateTransaction(id) => write!(f, "transaction {id} appears more than once"),
            Self::LedgerFull => write!(f, "ledger is full"),
        }
    }
}

/// Failures around validation that are not a verdict on the block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The statistics collector stopped listening.
    #[error("Outcome channel closed")]
    OutcomeChannelClosed,

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The ledger refused an append for a reason other than a verdict.
    #[error("Ledger failure: {0}")]
    Ledger(LedgerError),
}

impl ValidationError {
    /// Whether the worker may keep validating.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OutcomeChannelClosed => true,
            Self::Transport(e) => !e.ends_stream(),
            Self::Ledger(_) => false,
        }
    }
}
