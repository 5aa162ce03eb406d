//! Shared wiring for the integration scenarios.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ac_01_tx_pool::TransactionPool;
use ac_02_proof_of_work::ProofOfWork;
use ac_03_ledger::Ledger;
use ac_04_block_transport::{BlockMessage, BlockTransport};
use ac_05_mining::{MinerConfig, MinerDeps};
use ac_06_validation::{BlockValidator, ValidatorPool};
use shared_bus::{outcome_channel, OutcomeReceiver, SignalBus, DEFAULT_OUTCOME_CAPACITY};
use shared_types::{Block, Timestamp, Transaction};

pub const WAIT: Duration = Duration::from_secs(30);

/// Pool, ledger, transport and a running validator pool sharing one
/// signal bus.
pub struct Pipeline {
    pub signals: SignalBus,
    pub pool: Arc<TransactionPool>,
    pub ledger: Arc<Ledger>,
    pub transport: Arc<BlockTransport>,
    pub validators: Arc<ValidatorPool>,
    pub outcomes: OutcomeReceiver,
    pub per_block: usize,
}

impl Pipeline {
    pub fn new(pool_capacity: usize, per_block: usize, ledger_capacity: usize) -> Self {
        let signals = SignalBus::new();
        let pool = Arc::new(TransactionPool::new(pool_capacity).unwrap());
        let ledger = Arc::new(Ledger::new(ledger_capacity).unwrap());
        let transport = Arc::new(BlockTransport::new(per_block));
        let (tx, outcomes) = outcome_channel(DEFAULT_OUTCOME_CAPACITY);
        let validator = BlockValidator::new(
            ProofOfWork::default(),
            pool.clone(),
            ledger.clone(),
            signals.clone(),
            tx,
        );
        let validators = Arc::new(ValidatorPool::start(validator, transport.clone()));
        Self {
            signals,
            pool,
            ledger,
            transport,
            validators,
            outcomes,
            per_block,
        }
    }

    pub fn miner_deps(&self) -> MinerDeps {
        MinerDeps {
            pool: self.pool.clone(),
            ledger: self.ledger.clone(),
            transport: self.transport.clone(),
            signals: self.signals.clone(),
        }
    }

    pub fn miner_config(&self, num_miners: usize) -> MinerConfig {
        MinerConfig {
            num_miners,
            transactions_per_block: self.per_block,
            recheck_interval: Duration::from_millis(50),
            retry_interval: Duration::from_millis(10),
            ..MinerConfig::default()
        }
    }

    /// Publish `count` reward-1 transactions named `{prefix}-{i}`.
    pub async fn publish(&self, prefix: &str, count: usize) -> Vec<Transaction> {
        let mut published = Vec::with_capacity(count);
        for i in 0..count {
            let tx = Transaction::new(format!("{prefix}-{i}"), 1, 1, 2, 1.0, Timestamp::now()).unwrap();
            self.pool
                .publish(tx.clone(), Duration::from_millis(100))
                .await
                .unwrap();
            published.push(tx);
        }
        published
    }

    pub async fn stop(&self) {
        self.transport.close().await;
        self.validators.shutdown(Duration::from_secs(2)).await;
    }
}

/// A block over `txs` linked to `previous_hash`, already mined.
pub fn mined_message(miner_id: u32, id: &str, previous_hash: &str, txs: Vec<Transaction>) -> BlockMessage {
    let mut block = Block::new(id, previous_hash, Timestamp::now(), txs).unwrap();
    let result = ProofOfWork::default().mine(&mut block);
    assert!(result.is_found(), "proof of work gave up in a fixture");
    BlockMessage {
        miner_id,
        hash: result.hash,
        block,
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .expect("future did not complete in time")
}
