//! # Block Validator
//!
//! The checks and the commit shared by every validator worker.
//!
//! ## Check Order
//!
//! | Step | Check | Lock | Rejection |
//! |------|-------|------|-----------|
//! | 0 | No transaction id listed twice | none | `DuplicateTransaction` |
//! | 1 | Recomputed digest equals claim and meets difficulty | none | `InvalidProof` |
//! | 2 | `previous_hash` equals head (non-empty ledger) | head | `ChainMismatch` |
//! | 3 | Every transaction still pending | pool | `StaleTransaction` |
//! | 4 | Commit: re-check 3, append (re-checks 2), release | pool → ledger → head | any of the above, `LedgerFull` |
//!
//! Steps 2 and 3 are early exits. Step 4 repeats them atomically because
//! another validator may commit between the checks and the commit.

use std::collections::HashSet;
use std::sync::Arc;

use ac_01_tx_pool::{ConsumeError, TransactionPool};
use ac_02_proof_of_work::ProofOfWork;
use ac_03_ledger::{CommittedBlock, Ledger, LedgerError};
use ac_04_block_transport::BlockMessage;
use shared_bus::{OutcomeSender, SignalBus};
use shared_types::{Timestamp, ValidationOutcome};
use tracing::{info, warn};

use crate::error::{Rejection, Result, ValidationError};
use crate::metrics::ValidationMetrics;
use crate::state::{StateCell, ValidatorState};

/// Result of processing one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Committed at the given ledger slot.
    Committed { slot: usize, credits: u32 },
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Validation and commit logic, cloned into every worker.
#[derive(Clone, Debug)]
pub struct BlockValidator {
    pow: ProofOfWork,
    pool: Arc<TransactionPool>,
    ledger: Arc<Ledger>,
    signals: SignalBus,
    outcomes: OutcomeSender,
    metrics: Arc<ValidationMetrics>,
}

impl BlockValidator {
    pub fn new(
        pow: ProofOfWork,
        pool: Arc<TransactionPool>,
        ledger: Arc<Ledger>,
        signals: SignalBus,
        outcomes: OutcomeSender,
    ) -> Self {
        Self {
            pow,
            pool,
            ledger,
            signals,
            outcomes,
            metrics: Arc::new(ValidationMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ValidationMetrics> {
        self.metrics.clone()
    }

    /// Run the read-only checks, stopping at the first failure.
    pub fn check(&self, msg: &BlockMessage) -> std::result::Result<(), Rejection> {
        let mut seen = HashSet::with_capacity(msg.block.transactions.len());
        if let Some(id) = msg.block.transaction_ids().find(|id| !seen.insert(*id)) {
            return Err(Rejection::DuplicateTransaction(id.to_string()));
        }

        self.pow
            .verify(&msg.block, &msg.hash)
            .map_err(Rejection::InvalidProof)?;

        self.ledger
            .check_link(&msg.block.previous_hash)
            .map_err(|e| match e {
                LedgerError::ChainMismatch { expected, found } => {
                    Rejection::ChainMismatch { expected, found }
                }
                _ => Rejection::LedgerFull,
            })?;

        let missing = self
            .pool
            .inspect(|table| table.first_missing(msg.block.transaction_ids()).map(str::to_string));
        match missing {
            Some(id) => Err(Rejection::StaleTransaction(id)),
            None => Ok(()),
        }
    }

    /// Atomically re-check membership and linkage, append to the ledger and
    /// release the block's transactions. Returns the ledger slot.
    pub fn commit(&self, msg: &BlockMessage, credits: u32) -> Result<std::result::Result<usize, Rejection>> {
        let ids: Vec<&str> = msg.block.transaction_ids().collect();
        let committed = self.pool.consume_with(&ids, || {
            self.ledger.append(CommittedBlock {
                block: msg.block.clone(),
                hash: msg.hash.clone(),
                miner_id: msg.miner_id,
                credits,
                committed_at: Timestamp::now(),
            })
        });

        match committed {
            Ok(slot) => Ok(Ok(slot)),
            Err(ConsumeError::Missing(id)) => Ok(Err(Rejection::StaleTransaction(id))),
            Err(ConsumeError::Commit(LedgerError::ChainMismatch { expected, found })) => {
                Ok(Err(Rejection::ChainMismatch { expected, found }))
            }
            Err(ConsumeError::Commit(LedgerError::Full { .. })) => Ok(Err(Rejection::LedgerFull)),
            Err(ConsumeError::Commit(e)) => Err(ValidationError::Ledger(e)),
        }
    }

    /// Validate, commit when valid, and report exactly one outcome.
    ///
    /// A closed outcome channel is reported after the verdict has taken
    /// effect: a committed block stays committed.
    pub async fn process(&self, validator: usize, msg: &BlockMessage, state: &StateCell) -> Result<Verdict> {
        self.metrics.record_received();
        state.set(ValidatorState::Validating);

        let credits = u32::from(msg.block.max_reward());
        let verdict = match self.check(msg) {
            Err(rejection) => Verdict::Rejected(rejection),
            Ok(()) => {
                state.set(ValidatorState::Committing);
                match self.commit(msg, credits)? {
                    Ok(slot) => Verdict::Committed { slot, credits },
                    Err(rejection) => Verdict::Rejected(rejection),
                }
            }
        };

        match &verdict {
            Verdict::Committed { slot, credits } => {
                self.metrics.record_committed();
                self.signals.occupancy_check.request();
                let event = serde_json::json!({
                    "subsystem_id": "ac-06",
                    "event_type": "BlockCommitted",
                    "validator": validator,
                    "miner_id": msg.miner_id,
                    "block_id": msg.block.id,
                    "block_hash": msg.hash,
                    "previous_hash": msg.block.previous_hash,
                    "metadata": {
                        "slot": slot,
                        "credits": credits,
                        "transactions": msg.block.transactions.len(),
                    }
                });
                info!("EVENT_FLOW_JSON {}", event);
                info!(
                    validator,
                    miner = msg.miner_id,
                    block = %msg.block.id,
                    slot,
                    "[ac-06] ✅ Block committed"
                );
            }
            Verdict::Rejected(rejection) => {
                self.metrics.record_rejection(rejection);
                warn!(
                    validator,
                    miner = msg.miner_id,
                    block = %msg.block.id,
                    reason = rejection.kind(),
                    "[ac-06] ❌ Block rejected: {}",
                    rejection
                );
            }
        }

        let outcome = ValidationOutcome {
            miner_id: msg.miner_id,
            valid: verdict.is_committed(),
            credits: match verdict {
                Verdict::Committed { credits, .. } => credits,
                Verdict::Rejected(_) => 0,
            },
            created_at: msg.block.timestamp,
            validated_at: Timestamp::now(),
        };
        self.outcomes
            .send(outcome)
            .await
            .map_err(|_| ValidationError::OutcomeChannelClosed)?;
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{outcome_channel, OutcomeReceiver};
    use shared_types::{Block, Transaction, GENESIS_HASH};
    use std::time::Duration;

    struct Fixture {
        validator: BlockValidator,
        pool: Arc<TransactionPool>,
        ledger: Arc<Ledger>,
        outcomes: OutcomeReceiver,
    }

    fn fixture(ledger_capacity: usize) -> Fixture {
        let pool = Arc::new(TransactionPool::new(10).unwrap());
        let ledger = Arc::new(Ledger::new(ledger_capacity).unwrap());
        let (tx, rx) = outcome_channel(16);
        let validator = BlockValidator::new(
            ProofOfWork::default(),
            pool.clone(),
            ledger.clone(),
            SignalBus::new(),
            tx,
        );
        Fixture {
            validator,
            pool,
            ledger,
            outcomes: rx,
        }
    }

    async fn publish(pool: &TransactionPool, ids: &[&str]) -> Vec<Transaction> {
        let mut txs = Vec::new();
        for id in ids {
            let tx = Transaction::new(*id, 1, 1, 2, 3.0, Timestamp::now()).unwrap();
            pool.publish(tx.clone(), Duration::from_millis(50)).await.unwrap();
            txs.push(tx);
        }
        txs
    }

    fn mined(id: &str, previous: &str, txs: Vec<Transaction>) -> BlockMessage {
        let mut block = Block::new(id, previous, Timestamp::now(), txs).unwrap();
        let result = ProofOfWork::default().mine(&mut block);
        assert!(result.is_found());
        BlockMessage {
            miner_id: 1,
            hash: result.hash,
            block,
        }
    }

    #[tokio::test]
    async fn test_valid_block_is_committed_and_reported() {
        let mut f = fixture(3);
        let txs = publish(&f.pool, &["a", "b", "c"]).await;
        let msg = mined("BLK-1-1", GENESIS_HASH, txs);

        let verdict = f.validator.process(0, &msg, &StateCell::default()).await.unwrap();
        assert_eq!(verdict, Verdict::Committed { slot: 0, credits: 1 });
        assert_eq!(f.pool.occupied_slots(), 0);
        assert_eq!(f.ledger.head_hash(), msg.hash);

        let outcome = f.outcomes.recv().await.unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.credits, 1);
        assert_eq!(outcome.created_at, msg.block.timestamp);
    }

    #[tokio::test]
    async fn test_tampered_block_fails_proof() {
        let mut f = fixture(3);
        let txs = publish(&f.pool, &["a", "b"]).await;
        let mut msg = mined("BLK-1-1", GENESIS_HASH, txs);
        msg.block.nonce += 1;

        let verdict = f.validator.process(0, &msg, &StateCell::default()).await.unwrap();
        assert!(matches!(verdict, Verdict::Rejected(Rejection::InvalidProof(_))));
        assert_eq!(f.pool.occupied_slots(), 2);
        assert!(f.ledger.is_empty());
        assert!(!f.outcomes.recv().await.unwrap().valid);
    }

    #[tokio::test]
    async fn test_block_on_stale_head_is_rejected() {
        let f = fixture(3);
        let first = publish(&f.pool, &["a"]).await;
        let second = publish(&f.pool, &["b"]).await;

        let msg1 = mined("BLK-1-1", GENESIS_HASH, first);
        let msg2 = mined("BLK-2-1", GENESIS_HASH, second);
        assert!(f.validator.process(0, &msg1, &StateCell::default()).await.unwrap().is_committed());

        let verdict = f.validator.process(1, &msg2, &StateCell::default()).await.unwrap();
        assert!(matches!(verdict, Verdict::Rejected(Rejection::ChainMismatch { .. })));
        assert_eq!(f.pool.occupied_slots(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_loses_at_commit() {
        let f = fixture(3);
        let txs = publish(&f.pool, &["a", "b", "c"]).await;
        let msg = mined("BLK-1-1", GENESIS_HASH, txs);

        // Both copies pass the early checks before either commits.
        assert_eq!(f.validator.check(&msg), Ok(()));
        assert_eq!(f.validator.check(&msg), Ok(()));

        assert_eq!(f.validator.commit(&msg, 1).unwrap(), Ok(0));
        assert_eq!(
            f.validator.commit(&msg, 1).unwrap(),
            Err(Rejection::StaleTransaction("a".into()))
        );
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_sequential_redelivery_is_reported_invalid() {
        let mut f = fixture(3);
        let txs = publish(&f.pool, &["a", "b", "c"]).await;
        let msg = mined("BLK-1-1", GENESIS_HASH, txs);

        assert!(f.validator.process(0, &msg, &StateCell::default()).await.unwrap().is_committed());
        let verdict = f.validator.process(1, &msg, &StateCell::default()).await.unwrap();
        assert!(!verdict.is_committed());
        assert_eq!(f.ledger.len(), 1);

        assert!(f.outcomes.recv().await.unwrap().valid);
        assert!(!f.outcomes.recv().await.unwrap().valid);
    }

    #[tokio::test]
    async fn test_full_ledger_rejects_without_consuming() {
        let f = fixture(1);
        let first = publish(&f.pool, &["a"]).await;
        let msg1 = mined("BLK-1-1", GENESIS_HASH, first);
        assert!(f.validator.process(0, &msg1, &StateCell::default()).await.unwrap().is_committed());

        let second = publish(&f.pool, &["b"]).await;
        let msg2 = mined("BLK-1-2", &msg1.hash, second);
        let verdict = f.validator.process(0, &msg2, &StateCell::default()).await.unwrap();
        assert_eq!(verdict, Verdict::Rejected(Rejection::LedgerFull));
        assert_eq!(f.pool.occupied_slots(), 1);
    }

    #[tokio::test]
    async fn test_closed_outcome_channel_keeps_commit() {
        let f = fixture(2);
        let txs = publish(&f.pool, &["a"]).await;
        let msg = mined("BLK-1-1", GENESIS_HASH, txs);
        drop(f.outcomes);

        let result = f.validator.process(0, &msg, &StateCell::default()).await;
        assert_eq!(result, Err(ValidationError::OutcomeChannelClosed));
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_requests_occupancy_check() {
        let f = fixture(2);
        let txs = publish(&f.pool, &["a"]).await;
        let msg = mined("BLK-1-1", GENESIS_HASH, txs);
        let before = f.validator.signals.occupancy_check.total_requests();

        f.validator.process(0, &msg, &StateCell::default()).await.unwrap();
        assert_eq!(f.validator.signals.occupancy_check.total_requests(), before + 1);
        assert_eq!(f.validator.metrics().snapshot().blocks_committed, 1);
    }

    #[tokio::test]
    async fn test_repeated_transaction_id_is_rejected() {
        let mut f = fixture(3);
        let txs = publish(&f.pool, &["a", "b"]).await;
        let forged = vec![txs[0].clone(), txs[1].clone(), txs[0].clone()];
        let msg = mined("BLK-1-1", GENESIS_HASH, forged);

        let verdict = f.validator.process(0, &msg, &StateCell::default()).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::DuplicateTransaction("a".into()))
        );
        assert_eq!(f.pool.occupied_slots(), 2);
        assert!(f.ledger.is_empty());
        assert!(!f.outcomes.recv().await.unwrap().valid);
        assert_eq!(f.validator.metrics().snapshot().rejected_duplicate, 1);
    }
}
