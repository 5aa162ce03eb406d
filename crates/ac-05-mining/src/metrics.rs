//! Metrics collection for the miner pool

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Counters shared by every miner worker
#[derive(Debug, Default)]
pub struct MiningMetrics {
    /// Blocks written to the transport
    pub blocks_published: AtomicU64,

    /// Digests computed across all attempts
    pub pow_operations: AtomicU64,

    /// Total time spent in successful searches (milliseconds)
    pub mining_time_ms: AtomicU64,

    /// Searches that hit the operation cap
    pub give_ups: AtomicU64,

    /// Attempts skipped because nothing changed since the last publish
    pub skipped_duplicates: AtomicU64,

    /// Transport writes retried after an I/O error
    pub send_retries: AtomicU64,
}

/// Point-in-time copy of [`MiningMetrics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MiningSnapshot {
    pub blocks_published: u64,
    pub pow_operations: u64,
    pub mining_time_ms: u64,
    pub give_ups: u64,
    pub skipped_duplicates: u64,
    pub send_retries: u64,
}

impl MiningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search(&self, operations: u64, elapsed: Duration, gave_up: bool) {
        self.pow_operations.fetch_add(operations, Ordering::Relaxed);
        if gave_up {
            self.give_ups.fetch_add(1, Ordering::Relaxed);
        } else {
            self.mining_time_ms
                .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        }
    }

    pub fn record_published(&self) {
        self.blocks_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_retry(&self) {
        self.send_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MiningSnapshot {
        MiningSnapshot {
            blocks_published: self.blocks_published.load(Ordering::Relaxed),
            pow_operations: self.pow_operations.load(Ordering::Relaxed),
            mining_time_ms: self.mining_time_ms.load(Ordering::Relaxed),
            give_ups: self.give_ups.load(Ordering::Relaxed),
            skipped_duplicates: self.skipped_duplicates.load(Ordering::Relaxed),
            send_retries: self.send_retries.load(Ordering::Relaxed),
        }
    }

    /// Average digests per published block
    pub fn avg_operations_per_block(&self) -> f64 {
        let blocks = self.blocks_published.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        self.pow_operations.load(Ordering::Relaxed) as f64 / blocks as f64
    }
}
