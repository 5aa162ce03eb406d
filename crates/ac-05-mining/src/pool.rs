//! Miner pool lifecycle: start N workers, stop and join them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ac_01_tx_pool::TransactionPool;
use ac_03_ledger::Ledger;
use ac_04_block_transport::BlockTransport;
use shared_bus::{ShutdownSignal, SignalBus};
use shared_types::MinerId;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::MinerConfig;
use crate::error::{MiningError, Result};
use crate::metrics::MiningMetrics;
use crate::worker::{MinerWorker, StopListener};

/// Shared components every miner reads from or writes to.
#[derive(Clone, Debug)]
pub struct MinerDeps {
    pub pool: Arc<TransactionPool>,
    pub ledger: Arc<Ledger>,
    pub transport: Arc<BlockTransport>,
    pub signals: SignalBus,
}

/// Handle to the running miner workers.
#[derive(Debug)]
pub struct MinerPool {
    handles: Vec<(MinerId, JoinHandle<()>)>,
    stop: ShutdownSignal,
    cancel: Arc<AtomicBool>,
    metrics: Arc<MiningMetrics>,
}

impl MinerPool {
    /// Validate `config` against the shared components and spawn one worker
    /// per miner, with ids `1..=num_miners`.
    pub fn start(config: MinerConfig, deps: MinerDeps) -> Result<Self> {
        config.validate()?;
        let per_block = config.transactions_per_block;
        if per_block > deps.pool.capacity() {
            return Err(MiningError::BlockLargerThanPool {
                per_block,
                capacity: deps.pool.capacity(),
            });
        }
        if deps.transport.transactions_per_block() != per_block {
            return Err(MiningError::TransportMismatch {
                transport: deps.transport.transactions_per_block(),
                miners: per_block,
            });
        }

        let stop = ShutdownSignal::new();
        let cancel = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(MiningMetrics::new());

        let handles = (1..=config.num_miners as MinerId)
            .map(|id| {
                let listener = StopListener {
                    global: deps.signals.shutdown.subscribe(),
                    local: stop.subscribe(),
                };
                let worker = MinerWorker::new(
                    id,
                    config.clone(),
                    deps.clone(),
                    metrics.clone(),
                    cancel.clone(),
                    listener,
                );
                (id, tokio::spawn(worker.run()))
            })
            .collect();

        info!(
            miners = config.num_miners,
            per_block,
            max_operations = config.pow_max_operations,
            "[ac-05] 🚀 Miner pool started"
        );
        Ok(Self {
            handles,
            stop,
            cancel,
            metrics,
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn metrics(&self) -> Arc<MiningMetrics> {
        self.metrics.clone()
    }

    /// Stop every worker, abort in-flight searches and wait for them.
    pub async fn shutdown(self) {
        self.stop.trigger();
        self.cancel.store(true, Ordering::Relaxed);
        for (id, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(miner = id, error = %e, "[ac-05] miner task ended abnormally");
            }
        }
        info!(
            published = self.metrics.snapshot().blocks_published,
            "[ac-05] Miner pool stopped"
        );
    }
}
