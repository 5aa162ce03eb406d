//! # Ledger
//!
//! `B` block slots behind one lock, plus the head hash behind its own lock.
//! Lock order inside this type is always `blocks` → `head`.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{Block, MinerId, Timestamp, GENESIS_HASH};
use tracing::{debug, info};

use crate::dump::LedgerDump;
use crate::errors::{LedgerError, Result};

/// A block plus the metadata recorded when it was committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommittedBlock {
    pub block: Block,
    /// Proof-of-work digest; becomes the new head hash.
    pub hash: String,
    pub miner_id: MinerId,
    pub credits: u32,
    pub committed_at: Timestamp,
}

/// Shared append-only ledger.
#[derive(Debug)]
pub struct Ledger {
    capacity: usize,
    blocks: Mutex<Vec<Option<CommittedBlock>>>,
    head: Mutex<String>,
    committed: AtomicUsize,
}

impl Ledger {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LedgerError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            blocks: Mutex::new(vec![None; capacity]),
            head: Mutex::new(GENESIS_HASH.to_string()),
            committed: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.committed.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Hash of the latest committed block, or the genesis hash.
    pub fn head_hash(&self) -> String {
        self.head.lock().clone()
    }

    /// Under the head lock: a non-empty ledger requires `previous_hash` to be
    /// the current head.
    pub fn check_link(&self, previous_hash: &str) -> Result<()> {
        let head = self.head.lock();
        self.link_matches(&head, previous_hash)
    }

    fn link_matches(&self, head: &str, previous_hash: &str) -> Result<()> {
        if self.is_empty() || head == previous_hash {
            Ok(())
        } else {
            Err(LedgerError::ChainMismatch {
                expected: head.to_string(),
                found: previous_hash.to_string(),
            })
        }
    }

    /// Store `entry` in the first empty slot and advance the head.
    ///
    /// Linkage is re-checked under both locks, so of two blocks built on the
    /// same head only the first to arrive is accepted.
    pub fn append(&self, entry: CommittedBlock) -> Result<usize> {
        let mut blocks = self.blocks.lock();
        let index = blocks
            .iter()
            .position(Option::is_none)
            .ok_or(LedgerError::Full {
                capacity: self.capacity,
            })?;

        let mut head = self.head.lock();
        self.link_matches(&head, &entry.block.previous_hash)?;

        head.clone_from(&entry.hash);
        let block_id = entry.block.id.clone();
        let miner_id = entry.miner_id;
        blocks[index] = Some(entry);
        let committed = self.committed.fetch_add(1, Ordering::AcqRel) + 1;
        drop(head);
        drop(blocks);

        debug!(slot = index, block = %block_id, miner = miner_id, "[ac-03] block appended");
        if committed == self.capacity {
            info!(capacity = self.capacity, "[ac-03] 📦 ledger full");
        }
        Ok(index)
    }

    /// Committed blocks in slot order.
    pub fn blocks(&self) -> Vec<CommittedBlock> {
        self.blocks.lock().iter().flatten().cloned().collect()
    }

    /// Whether slot `index` holds a committed block.
    pub fn is_committed(&self, index: usize) -> bool {
        self.blocks
            .lock()
            .get(index)
            .is_some_and(Option::is_some)
    }

    /// Re-check that every committed block links to its predecessor, and
    /// that the head hash is the last block's hash.
    pub fn verify_chain(&self) -> Result<()> {
        let blocks = self.blocks.lock();
        let committed: Vec<&CommittedBlock> = blocks.iter().flatten().collect();
        audit(&committed)?;

        let head = self.head.lock();
        let expected = committed.last().map_or(GENESIS_HASH, |b| b.hash.as_str());
        if *head != expected {
            return Err(LedgerError::BrokenLink {
                index: committed.len(),
            });
        }
        Ok(())
    }

    /// Snapshot for the end-of-run report.
    pub fn dump(&self) -> LedgerDump {
        let blocks = self.blocks();
        let audit = self.verify_chain();
        LedgerDump::new(self.capacity, blocks, audit)
    }
}

fn audit(blocks: &[&CommittedBlock]) -> Result<()> {
    for (index, pair) in blocks.windows(2).enumerate() {
        if pair[1].block.previous_hash != pair[0].hash {
            return Err(LedgerError::BrokenLink { index: index + 1 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Transaction;
    use std::sync::Arc;

    fn entry(id: &str, previous: &str, hash: &str) -> CommittedBlock {
        let tx = Transaction::new(format!("{id}-tx"), 1, 1, 2, 3.0, Timestamp::from_millis(5))
            .unwrap();
        CommittedBlock {
            block: Block::new(id, previous, Timestamp::from_millis(10), vec![tx]).unwrap(),
            hash: hash.to_string(),
            miner_id: 1,
            credits: 1,
            committed_at: Timestamp::from_millis(20),
        }
    }

    fn hash(n: u8) -> String {
        format!("{:0>64}", n)
    }

    #[test]
    fn test_empty_ledger_reports_genesis_head() {
        let ledger = Ledger::new(3).unwrap();
        assert_eq!(ledger.head_hash(), GENESIS_HASH);
        assert!(ledger.is_empty());
        assert!(ledger.verify_chain().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(Ledger::new(0).unwrap_err(), LedgerError::ZeroCapacity);
    }

    #[test]
    fn test_append_advances_head() {
        let ledger = Ledger::new(3).unwrap();
        assert_eq!(ledger.append(entry("b1", GENESIS_HASH, &hash(1))).unwrap(), 0);
        assert_eq!(ledger.head_hash(), hash(1));
        assert_eq!(ledger.append(entry("b2", &hash(1), &hash(2))).unwrap(), 1);
        assert_eq!(ledger.head_hash(), hash(2));
        assert!(ledger.is_committed(0));
        assert!(ledger.is_committed(1));
        assert!(!ledger.is_committed(2));
        assert!(ledger.verify_chain().is_ok());
    }

    #[test]
    fn test_stale_link_is_rejected_without_side_effects() {
        let ledger = Ledger::new(3).unwrap();
        ledger.append(entry("b1", GENESIS_HASH, &hash(1))).unwrap();

        let err = ledger
            .append(entry("b1-fork", GENESIS_HASH, &hash(9)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::ChainMismatch { .. }));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.head_hash(), hash(1));
        assert!(ledger.check_link(GENESIS_HASH).is_err());
        assert!(ledger.check_link(&hash(1)).is_ok());
    }

    #[test]
    fn test_first_block_accepts_any_previous_hash() {
        let ledger = Ledger::new(1).unwrap();
        assert!(ledger.check_link("anything").is_ok());
        ledger.append(entry("b1", &hash(7), &hash(1))).unwrap();
    }

    #[test]
    fn test_full_ledger_rejects_append() {
        let ledger = Ledger::new(1).unwrap();
        ledger.append(entry("b1", GENESIS_HASH, &hash(1))).unwrap();
        assert!(ledger.is_full());
        assert_eq!(
            ledger.append(entry("b2", &hash(1), &hash(2))).unwrap_err(),
            LedgerError::Full { capacity: 1 }
        );
    }

    #[test]
    fn test_concurrent_appends_on_same_head_commit_once() {
        let ledger = Arc::new(Ledger::new(4).unwrap());
        let handles: Vec<_> = (0..8u8)
            .map(|n| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    ledger
                        .append(entry(&format!("b{n}"), GENESIS_HASH, &hash(n + 10)))
                        .is_ok()
                })
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_audit_detects_broken_link() {
        let a = entry("b1", GENESIS_HASH, &hash(1));
        let b = entry("b2", &hash(5), &hash(2));
        assert_eq!(audit(&[&a, &b]), Err(LedgerError::BrokenLink { index: 1 }));
    }
}
