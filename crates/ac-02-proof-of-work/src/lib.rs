//! # Proof-of-Work Engine
//!
//! **Subsystem ID:** 2
//!
//! Pure, synchronous nonce search. Callers run it on a blocking thread.
//!
//! ## Hashed Layout
//!
//! ```text
//! SHA-256( blockId[32] | previousHash[64] | timestamp u64 | txs × 57 bytes | nonce u64 )
//! ```
//!
//! Everything before the nonce is absorbed once; each trial clones the hasher
//! state and appends only the 8 nonce bytes.
//!
//! ## Search
//!
//! The nonce starts at 0 and increments by one. Once it passes the operation
//! cap the engine gives up and the miner reassembles the block with a fresh
//! timestamp.

pub mod difficulty;
pub mod engine;

pub use difficulty::DifficultyLevel;
pub use engine::{block_hash, PowResult, ProofOfWork, SearchStatus};

use thiserror::Error;

/// Default nonce cap per attempt.
pub const DEFAULT_MAX_OPERATIONS: u64 = 10_000_000;

/// Reasons a claimed proof is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("Hash mismatch: computed {computed}, claimed {claimed}")]
    HashMismatch { computed: String, claimed: String },

    #[error("Hash {hash} does not meet {difficulty} difficulty")]
    DifficultyNotMet {
        hash: String,
        difficulty: DifficultyLevel,
    },
}
