//! # Transaction Generator
//!
//! Each generator publishes one transaction every `interval_ms` with a fixed
//! reward and random sender, receiver and value. A publish that times out on
//! a full pool is retried with the same transaction until it lands or the
//! node shuts down.

use std::sync::Arc;
use std::time::Duration;

use ac_01_tx_pool::{PoolError, TransactionPool};
use rand::Rng;
use shared_bus::ShutdownListener;
use shared_types::{Timestamp, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GeneratorConfig;

pub struct TransactionGenerator {
    index: usize,
    config: GeneratorConfig,
    pool: Arc<TransactionPool>,
    wait: Duration,
    produced: u64,
}

impl TransactionGenerator {
    pub fn new(index: usize, config: GeneratorConfig, pool: Arc<TransactionPool>, wait: Duration) -> Self {
        Self {
            index,
            config,
            pool,
            wait,
            produced: 0,
        }
    }

    /// A fresh transaction with this generator's reward.
    pub fn next_transaction(&self) -> shared_types::Result<Transaction> {
        let mut rng = rand::thread_rng();
        Transaction::new(
            Uuid::new_v4().simple().to_string(),
            self.config.reward,
            rng.gen_range(1..=1000),
            rng.gen_range(1..=1000),
            rng.gen_range(0.01..1000.0),
            Timestamp::now(),
        )
    }

    /// Produce until shutdown or until the pool closes. Returns the number
    /// of transactions published.
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> u64 {
        info!(
            generator = self.index,
            reward = self.config.reward,
            interval_ms = self.config.interval_ms,
            "[generator] Transaction generator started"
        );
        let interval = Duration::from_millis(self.config.interval_ms);

        'produce: loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.wait() => break,
            }

            let tx = match self.next_transaction() {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(generator = self.index, error = %e, "[generator] could not build transaction");
                    continue;
                }
            };

            loop {
                let published = tokio::select! {
                    published = self.pool.publish(tx.clone(), self.wait) => published,
                    _ = shutdown.wait() => break 'produce,
                };
                match published {
                    Ok(slot) => {
                        self.produced += 1;
                        debug!(generator = self.index, tx = %tx.id(), slot, "[generator] transaction published");
                        break;
                    }
                    Err(e) if e.is_recoverable() => {
                        debug!(generator = self.index, error = %e, "[generator] pool full, retrying");
                    }
                    Err(PoolError::Closed) => break 'produce,
                    Err(e) => {
                        warn!(generator = self.index, error = %e, "[generator] transaction dropped");
                        break;
                    }
                }
            }
        }

        info!(generator = self.index, produced = self.produced, "[generator] Transaction generator stopped");
        self.produced
    }
}
