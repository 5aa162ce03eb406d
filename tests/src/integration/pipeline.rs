//! # Pipeline Flows
//!
//! Transactions published to the pool are mined into blocks, carried over
//! the transport, validated and committed.
//!
//! ```text
//! pool ──select──► miner ──frame──► transport ──► validator ──append──► ledger
//!   ▲                                                 │
//!   └──────────────── consume on commit ──────────────┘
//! ```

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use ac_02_proof_of_work::ProofOfWork;
    use ac_05_mining::{MinerConfig, MinerPool};
    use shared_types::GENESIS_HASH;

    use crate::integration::fixtures::{mined_message, wait_until, within, Pipeline};

    /// Capacity 10, 3 per block: three publishes give 30 %, one mined block
    /// empties the pool and fills ledger slot 0.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_published_transactions_end_up_in_ledger() {
        let mut p = Pipeline::new(10, 3, 10);
        let txs = p.publish("tx", 3).await;
        assert!((p.pool.occupancy_percent() - 30.0).abs() < f64::EPSILON);

        let miners = MinerPool::start(p.miner_config(1), p.miner_deps()).unwrap();
        p.signals.miner_wake.wake_all();

        let outcome = within(p.outcomes.recv()).await.unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.credits, 1);

        assert_eq!(p.pool.occupied_slots(), 0);
        assert_eq!(p.pool.occupancy_percent(), 0.0);
        assert!(p.ledger.is_committed(0));
        assert!(!p.ledger.is_committed(1));

        let committed = &p.ledger.blocks()[0];
        assert_eq!(committed.block.previous_hash, GENESIS_HASH);
        let ids: HashSet<&str> = committed.block.transaction_ids().collect();
        let expected: HashSet<&str> = txs.iter().map(|tx| tx.id()).collect();
        assert_eq!(ids, expected);

        miners.shutdown().await;
        p.stop().await;
    }

    /// The same block delivered twice to two validators is committed once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_duplicate_delivery_commits_once() {
        let mut p = Pipeline::new(10, 2, 4);
        assert_eq!(p.validators.scale_to(2), 2);
        let txs = p.publish("dup", 2).await;

        let msg = mined_message(1, "BLK-1-1", GENESIS_HASH, txs);
        p.transport.send(&msg).await.unwrap();
        p.transport.send(&msg).await.unwrap();

        let first = within(p.outcomes.recv()).await.unwrap();
        let second = within(p.outcomes.recv()).await.unwrap();
        let valid = [first.valid, second.valid].iter().filter(|v| **v).count();
        assert_eq!(valid, 1);

        assert_eq!(p.ledger.len(), 1);
        assert_eq!(p.ledger.head_hash(), msg.hash);
        assert_eq!(p.pool.occupied_slots(), 0);

        let snapshot = p.validators.validator().metrics().snapshot();
        assert_eq!(snapshot.blocks_committed, 1);
        assert_eq!(snapshot.blocks_received, 2);
        assert_eq!(snapshot.rejected(), 1);

        p.stop().await;
    }

    /// A block mined on a stale head is rejected and its transactions stay
    /// in the pool for the next attempt.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stale_head_keeps_transactions() {
        let mut p = Pipeline::new(10, 1, 4);
        let first = p.publish("a", 1).await;
        let second = p.publish("b", 1).await;

        let head = mined_message(1, "BLK-1-1", GENESIS_HASH, first);
        p.transport.send(&head).await.unwrap();
        assert!(within(p.outcomes.recv()).await.unwrap().valid);

        let stale = mined_message(2, "BLK-2-1", GENESIS_HASH, second.clone());
        p.transport.send(&stale).await.unwrap();
        let outcome = within(p.outcomes.recv()).await.unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.credits, 0);
        assert!(p.pool.contains_all([second[0].id()]));

        let relinked = mined_message(2, "BLK-2-2", &head.hash, second);
        p.transport.send(&relinked).await.unwrap();
        assert!(within(p.outcomes.recv()).await.unwrap().valid);
        assert_eq!(p.ledger.len(), 2);

        p.stop().await;
    }

    /// Several miners racing over three validators still build one linked
    /// chain.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_miners_build_linked_chain() {
        let p = Pipeline::new(9, 3, 3);
        assert_eq!(p.validators.scale_to(3), 3);
        p.publish("race", 9).await;

        let miners = MinerPool::start(p.miner_config(3), p.miner_deps()).unwrap();
        p.signals.miner_wake.wake_all();

        wait_until(|| p.ledger.is_full()).await;
        assert!(p.ledger.verify_chain().is_ok());
        assert!(p.ledger.dump().chain_is_valid());
        assert_eq!(p.pool.occupied_slots(), 0);

        let mut seen = HashSet::new();
        for committed in p.ledger.blocks() {
            for id in committed.block.transaction_ids() {
                assert!(seen.insert(id.to_string()), "transaction {id} committed twice");
            }
        }
        assert_eq!(seen.len(), 9);

        miners.shutdown().await;
        p.stop().await;
    }

    /// With a tiny operation cap every search gives up a few times; the
    /// miner reassembles with a fresh timestamp until a proof is found and
    /// the block still commits.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_capped_search_retries_until_committed() {
        let mut p = Pipeline::new(10, 3, 4);
        p.publish("cap", 3).await;

        let config = MinerConfig {
            pow_max_operations: 50,
            ..p.miner_config(1)
        };
        let miners = MinerPool::start(config, p.miner_deps()).unwrap();
        let metrics = miners.metrics();
        p.signals.miner_wake.wake_all();

        let outcome = within(p.outcomes.recv()).await.unwrap();
        assert!(outcome.valid);
        assert_eq!(p.ledger.len(), 1);

        // Give-ups are recorded before the block is written.
        assert!(metrics.snapshot().give_ups > 0, "search never hit the cap");

        let committed = &p.ledger.blocks()[0];
        assert!(ProofOfWork::default()
            .verify(&committed.block, &committed.hash)
            .is_ok());

        miners.shutdown().await;
        p.stop().await;
    }
}
