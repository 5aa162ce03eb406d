//! # Validation (ac-06)
//!
//! Validators read mined blocks from the shared transport, verify them and
//! commit the valid ones to the ledger, releasing their transactions from
//! the pool. Every received block produces exactly one
//! [`shared_types::ValidationOutcome`] for the statistics collector.
//!
//! ## Worker Loop
//!
//! ```text
//!  ┌──────┐  recv   ┌───────────┐  ok   ┌────────────┐
//!  │ IDLE │ ──────► │ VALIDATING│ ────► │ COMMITTING │ ──┐
//!  └──────┘         └───────────┘       └────────────┘   │
//!     ▲                   │ rejected                      │
//!     └───────────────────┴───────────────────────────────┘
//!                 (outcome sent on every path)
//! ```
//!
//! ## Pool Size
//!
//! | Slot | Role | Started | Retired |
//! |------|------|---------|---------|
//! | 0 | base | with the pool | never by scaling |
//! | 1 | auxiliary | `scale_to(≥2)` | `scale_to(1)` |
//! | 2 | auxiliary | `scale_to(3)` | `scale_to(≤2)` |
//!
//! A worker exits when the transport reports closure (EOF or a malformed
//! frame) or when its slot is retired. Retirement is honoured only between
//! messages.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod metrics;
pub mod pool;
pub mod state;
pub mod validator;
mod worker;

pub use error::{Rejection, Result, ValidationError};
pub use metrics::{ValidationMetrics, ValidationSnapshot};
pub use pool::ValidatorPool;
pub use state::{StateCell, ValidatorState};
pub use validator::{BlockValidator, Verdict};

/// The base validator.
pub const MIN_VALIDATORS: usize = 1;

/// Base plus two auxiliaries.
pub const MAX_VALIDATORS: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use ac_01_tx_pool::TransactionPool;
    use ac_02_proof_of_work::ProofOfWork;
    use ac_03_ledger::Ledger;
    use ac_04_block_transport::{BlockMessage, BlockTransport};
    use shared_bus::{outcome_channel, OutcomeReceiver, SignalBus};
    use shared_types::{Block, Timestamp, Transaction, GENESIS_HASH};
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        pool: Arc<TransactionPool>,
        ledger: Arc<Ledger>,
        transport: Arc<BlockTransport>,
        outcomes: OutcomeReceiver,
        validators: ValidatorPool,
    }

    fn harness(per_block: usize) -> Harness {
        let pool = Arc::new(TransactionPool::new(10).unwrap());
        let ledger = Arc::new(Ledger::new(4).unwrap());
        let transport = Arc::new(BlockTransport::new(per_block));
        let (tx, rx) = outcome_channel(16);
        let validator = BlockValidator::new(
            ProofOfWork::default(),
            pool.clone(),
            ledger.clone(),
            SignalBus::new(),
            tx,
        );
        Harness {
            pool,
            ledger,
            transport: transport.clone(),
            outcomes: rx,
            validators: ValidatorPool::start(validator, transport),
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_pool_starts_with_base_validator() {
        let h = harness(1);
        assert_eq!(h.validators.active(), 1);
        wait_until(|| h.validators.states() == vec![(0, ValidatorState::Reading)]).await;
        h.transport.close().await;
        h.validators.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_scale_to_clamps_and_retires_highest_first() {
        let h = harness(1);
        assert_eq!(h.validators.scale_to(0), 1);
        assert_eq!(h.validators.scale_to(9), 3);
        assert_eq!(h.validators.scale_to(2), 2);

        let slots: Vec<usize> = h.validators.states().into_iter().map(|(i, _)| i).collect();
        assert_eq!(slots, vec![0, 1]);

        // Idempotent.
        assert_eq!(h.validators.scale_to(2), 2);
        assert_eq!(h.validators.scale_to(1), 1);
        assert_eq!(h.validators.states()[0].0, 0);

        h.transport.close().await;
        h.validators.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_on_transport_is_committed() {
        let mut h = harness(2);
        let mut txs = Vec::new();
        for id in ["a", "b"] {
            let tx = Transaction::new(id, 2, 1, 2, 1.0, Timestamp::now()).unwrap();
            h.pool.publish(tx.clone(), Duration::from_millis(50)).await.unwrap();
            txs.push(tx);
        }
        let mut block = Block::new("BLK-1-1", GENESIS_HASH, Timestamp::now(), txs).unwrap();
        let result = ProofOfWork::default().mine(&mut block);
        h.transport
            .send(&BlockMessage {
                miner_id: 1,
                hash: result.hash.clone(),
                block,
            })
            .await
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), h.outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.credits, 2);
        assert_eq!(h.ledger.head_hash(), result.hash);
        assert_eq!(h.pool.occupied_slots(), 0);

        h.transport.close().await;
        h.validators.shutdown(Duration::from_secs(1)).await;
        assert_eq!(h.validators.active(), 0);
    }

    #[tokio::test]
    async fn test_closed_transport_stops_all_workers() {
        let h = harness(1);
        h.validators.scale_to(3);
        h.transport.close().await;
        wait_until(|| h.validators.active() == 0).await;
        assert!(h
            .validators
            .states()
            .iter()
            .all(|(_, state)| *state == ValidatorState::Stopped));
        tokio::time::timeout(
            Duration::from_secs(2),
            h.validators.shutdown(Duration::from_millis(500)),
        )
        .await
        .expect("validators did not drain");
    }

    #[tokio::test]
    async fn test_shutdown_without_close_stops_after_drain_window() {
        let h = harness(1);
        h.validators.scale_to(2);
        tokio::time::timeout(
            Duration::from_secs(2),
            h.validators.shutdown(Duration::from_millis(50)),
        )
        .await
        .expect("validators ignored stop");
    }
}
