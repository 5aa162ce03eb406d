//! Metrics collection for the validator pool

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::Rejection;

/// Counters shared by every validator worker
#[derive(Debug, Default)]
pub struct ValidationMetrics {
    pub blocks_received: AtomicU64,
    pub blocks_committed: AtomicU64,
    pub rejected_invalid_proof: AtomicU64,
    pub rejected_chain_mismatch: AtomicU64,
    pub rejected_stale: AtomicU64,
    pub rejected_duplicate: AtomicU64,
    pub rejected_ledger_full: AtomicU64,
}

/// Point-in-time copy of [`ValidationMetrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSnapshot {
    pub blocks_received: u64,
    pub blocks_committed: u64,
    pub rejected_invalid_proof: u64,
    pub rejected_chain_mismatch: u64,
    pub rejected_stale: u64,
    pub rejected_duplicate: u64,
    pub rejected_ledger_full: u64,
}

impl ValidationSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_invalid_proof
            + self.rejected_chain_mismatch
            + self.rejected_stale
            + self.rejected_duplicate
            + self.rejected_ledger_full
    }
}

impl ValidationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.blocks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_committed(&self) {
        self.blocks_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, rejection: &Rejection) {
        let counter = match rejection {
            Rejection::InvalidProof(_) => &self.rejected_invalid_proof,
            Rejection::ChainMismatch { .. } => &self.rejected_chain_mismatch,
            Rejection::StaleTransaction(_) => &self.rejected_stale,
            Rejection::DuplicateTransaction(_) => &self.rejected_duplicate,
            Rejection::LedgerFull => &self.rejected_ledger_full,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ValidationSnapshot {
        ValidationSnapshot {
            blocks_received: self.blocks_received.load(Ordering::Relaxed),
            blocks_committed: self.blocks_committed.load(Ordering::Relaxed),
            rejected_invalid_proof: self.rejected_invalid_proof.load(Ordering::Relaxed),
            rejected_chain_mismatch: self.rejected_chain_mismatch.load(Ordering::Relaxed),
            rejected_stale: self.rejected_stale.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
            rejected_ledger_full: self.rejected_ledger_full.load(Ordering::Relaxed),
        }
    }
}
