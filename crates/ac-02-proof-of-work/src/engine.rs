//! Nonce search and verification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use shared_types::{Block, ByteWriter};
use tracing::debug;

use crate::{DifficultyLevel, PowError, DEFAULT_MAX_OPERATIONS};

/// How often (in nonces) a cancellable search polls its stop flag.
const CANCEL_POLL_INTERVAL: u64 = 4096;

/// How a nonce search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    /// The nonce passed the operation cap without meeting the difficulty.
    GaveUp,
    /// The stop flag was raised.
    Cancelled,
}

/// Result of one mining attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowResult {
    /// Digest of the last nonce tried (the winning one when found).
    pub hash: String,
    pub nonce: u64,
    /// Number of digests computed.
    pub operations: u64,
    pub elapsed: Duration,
    pub difficulty: DifficultyLevel,
    pub status: SearchStatus,
}

impl PowResult {
    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Found
    }

    pub fn gave_up(&self) -> bool {
        self.status == SearchStatus::GaveUp
    }
}

/// Hasher state with every field except the nonce already absorbed.
struct PrefixHasher {
    prefix: Sha256,
}

impl PrefixHasher {
    fn new(block: &Block) -> Self {
        let mut writer = ByteWriter::with_capacity(
            shared_types::BLOCK_ID_LEN
                + shared_types::HASH_HEX_LEN
                + 8
                + block.transactions.len() * shared_types::Transaction::ENCODED_LEN,
        );
        block.write_hash_prefix(&mut writer);
        let mut prefix = Sha256::new();
        prefix.update(writer.as_slice());
        Self { prefix }
    }

    fn digest(&self, nonce: u64) -> String {
        let mut hasher = self.prefix.clone();
        hasher.update(nonce.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

/// SHA-256 hex digest of `block` at its current nonce.
pub fn block_hash(block: &Block) -> String {
    PrefixHasher::new(block).digest(block.nonce)
}

/// Proof-of-work engine with an operation cap.
#[derive(Clone, Copy, Debug)]
pub struct ProofOfWork {
    max_operations: u64,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OPERATIONS)
    }
}

impl ProofOfWork {
    pub fn new(max_operations: u64) -> Self {
        Self { max_operations }
    }

    pub fn max_operations(&self) -> u64 {
        self.max_operations
    }

    /// Search nonces `0..=max_operations` and store the winner in `block`.
    pub fn mine(&self, block: &mut Block) -> PowResult {
        self.search(block, None)
    }

    /// Like [`mine`](Self::mine) but stops early once `stop` is set.
    pub fn mine_cancellable(&self, block: &mut Block, stop: &AtomicBool) -> PowResult {
        self.search(block, Some(stop))
    }

    fn search(&self, block: &mut Block, stop: Option<&AtomicBool>) -> PowResult {
        let difficulty = DifficultyLevel::from_reward(block.max_reward());
        let hasher = PrefixHasher::new(block);
        let started = Instant::now();

        let finish = |hash: String, nonce: u64, operations: u64, status| PowResult {
            hash,
            nonce,
            operations,
            elapsed: started.elapsed(),
            difficulty,
            status,
        };

        let mut nonce = 0u64;
        loop {
            if let Some(stop) = stop {
                if nonce % CANCEL_POLL_INTERVAL == 0 && stop.load(Ordering::Relaxed) {
                    debug!(block = %block.id, nonce, "[ac-02] search cancelled");
                    return finish(String::new(), nonce, nonce, SearchStatus::Cancelled);
                }
            }

            let hash = hasher.digest(nonce);
            if difficulty.is_satisfied_by(&hash) {
                block.nonce = nonce;
                return finish(hash, nonce, nonce + 1, SearchStatus::Found);
            }

            if nonce >= self.max_operations {
                debug!(block = %block.id, %difficulty, "[ac-02] operation cap reached");
                return finish(hash, nonce, nonce + 1, SearchStatus::GaveUp);
            }
            nonce += 1;
        }
    }

    /// Recompute the digest of `block` and check it against `claimed` and
    /// the block's difficulty.
    pub fn verify(&self, block: &Block, claimed: &str) -> Result<(), PowError> {
        let computed = block_hash(block);
        if computed != claimed {
            return Err(PowError::HashMismatch {
                computed,
                claimed: claimed.to_string(),
            });
        }
        let difficulty = DifficultyLevel::from_reward(block.max_reward());
        if !difficulty.is_satisfied_by(&computed) {
            return Err(PowError::DifficultyNotMet {
                hash: computed,
                difficulty,
            });
        }
        Ok(())
    }
}
