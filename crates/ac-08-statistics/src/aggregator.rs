//! # Aggregation
//!
//! Per-miner counters folded from [`ValidationOutcome`]s. Latency is
//! `validated_at - created_at` and is averaged incrementally, so nothing
//! but the running mean and the sample count is stored.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use shared_types::{MinerId, ValidationOutcome};

/// Counters for one miner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MinerStats {
    pub valid_blocks: u64,
    pub invalid_blocks: u64,
    pub credits: u64,
    pub avg_latency_ms: f64,
}

impl MinerStats {
    pub fn blocks(&self) -> u64 {
        self.valid_blocks + self.invalid_blocks
    }

    fn record(&mut self, outcome: &ValidationOutcome) {
        if outcome.valid {
            self.valid_blocks += 1;
            self.credits += u64::from(outcome.credits);
        } else {
            self.invalid_blocks += 1;
        }
        let latency = outcome.latency().as_secs_f64() * 1000.0;
        self.avg_latency_ms += (latency - self.avg_latency_ms) / self.blocks() as f64;
    }
}

/// Running aggregate over every outcome received so far.
#[derive(Clone, Debug, Default)]
pub struct StatisticsAggregator {
    miners: BTreeMap<MinerId, MinerStats>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ValidationOutcome) {
        self.miners.entry(outcome.miner_id).or_default().record(outcome);
    }

    pub fn miner(&self, id: MinerId) -> Option<&MinerStats> {
        self.miners.get(&id)
    }

    pub fn outcomes(&self) -> u64 {
        self.miners.values().map(MinerStats::blocks).sum()
    }

    /// Snapshot for printing or export.
    pub fn report(&self, committed_blocks: usize, ledger_capacity: usize) -> StatisticsReport {
        let total_valid = self.miners.values().map(|m| m.valid_blocks).sum();
        let total_invalid = self.miners.values().map(|m| m.invalid_blocks).sum();
        let total_credits = self.miners.values().map(|m| m.credits).sum();

        let samples = self.outcomes();
        let avg_latency_ms = if samples == 0 {
            0.0
        } else {
            self.miners
                .values()
                .map(|m| m.avg_latency_ms * m.blocks() as f64)
                .sum::<f64>()
                / samples as f64
        };

        StatisticsReport {
            miners: self.miners.iter().map(|(id, s)| (*id, *s)).collect(),
            total_valid,
            total_invalid,
            total_credits,
            avg_latency_ms,
            committed_blocks,
            ledger_capacity,
        }
    }
}

/// Printable statistics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub miners: Vec<(MinerId, MinerStats)>,
    pub total_valid: u64,
    pub total_invalid: u64,
    pub total_credits: u64,
    pub avg_latency_ms: f64,
    pub committed_blocks: usize,
    pub ledger_capacity: usize,
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=========================== STATISTICS ===========================")?;
        writeln!(
            f,
            "{:>6} | {:>8} | {:>8} | {:>8} | {:>16}",
            "miner", "valid", "invalid", "credits", "avg latency (ms)"
        )?;
        writeln!(f, "-------+----------+----------+----------+-----------------")?;
        for (id, stats) in &self.miners {
            writeln!(
                f,
                "{:>6} | {:>8} | {:>8} | {:>8} | {:>16.2}",
                id, stats.valid_blocks, stats.invalid_blocks, stats.credits, stats.avg_latency_ms
            )?;
        }
        writeln!(f, "-------+----------+----------+----------+-----------------")?;
        writeln!(
            f,
            "{:>6} | {:>8} | {:>8} | {:>8} | {:>16.2}",
            "total", self.total_valid, self.total_invalid, self.total_credits, self.avg_latency_ms
        )?;
        write!(
            f,
            "blocks in ledger: {}/{}",
            self.committed_blocks, self.ledger_capacity
        )
    }
}
