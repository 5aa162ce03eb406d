//! Human-readable ledger dump, produced once after every worker has stopped.

use std::fmt;

use serde::Serialize;

use crate::errors::LedgerError;
use crate::ledger::CommittedBlock;

/// Snapshot of the ledger plus the chain audit result.
#[derive(Clone, Debug, Serialize)]
pub struct LedgerDump {
    pub capacity: usize,
    pub blocks: Vec<CommittedBlock>,
    /// `None` when every block links to its predecessor.
    pub audit_failure: Option<String>,
}

impl LedgerDump {
    pub(crate) fn new(
        capacity: usize,
        blocks: Vec<CommittedBlock>,
        audit: Result<(), LedgerError>,
    ) -> Self {
        Self {
            capacity,
            blocks,
            audit_failure: audit.err().map(|e| e.to_string()),
        }
    }

    pub fn chain_is_valid(&self) -> bool {
        self.audit_failure.is_none()
    }
}

impl fmt::Display for LedgerDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "==================== LEDGER ({}/{} blocks) ====================",
            self.blocks.len(),
            self.capacity
        )?;
        for (index, entry) in self.blocks.iter().enumerate() {
            let block = &entry.block;
            writeln!(
                f,
                "[{index}] {} | miner {} | credits {} | committed {}",
                block.id, entry.miner_id, entry.credits, entry.committed_at
            )?;
            writeln!(f, "    hash:     {}", entry.hash)?;
            writeln!(f, "    previous: {}", block.previous_hash)?;
            writeln!(f, "    nonce {} | created {}", block.nonce, block.timestamp)?;
            for tx in &block.transactions {
                writeln!(
                    f,
                    "    - {:<32} reward {} | {} -> {} | value {:.2} | {}",
                    tx.id(),
                    tx.reward(),
                    tx.sender_id(),
                    tx.receiver_id(),
                    tx.value(),
                    tx.timestamp()
                )?;
            }
        }
        match &self.audit_failure {
            None => writeln!(f, "chain audit: OK"),
            Some(reason) => writeln!(f, "chain audit: BROKEN ({reason})"),
        }
    }
}
