//! # Supervisor
//!
//! Builds the shared components, starts every role and runs the ordered
//! shutdown.
//!
//! ## Startup
//!
//! ```text
//!  pool ─ ledger ─ transport ─ outcome channel
//!     │
//!     ├─► statistics collector
//!     ├─► validator pool (base)
//!     ├─► miner pool (N)
//!     ├─► controller
//!     └─► generators
//! ```
//!
//! ## Shutdown Order
//!
//! 1. stop the controller
//! 2. stop generators (pool closed to producers) and miners
//! 3. close the transport write side
//! 4. let validators drain what was already sent
//! 5. drain the statistics collector and take its final report
//! 6. audit and dump the ledger

use std::sync::Arc;

use ac_01_tx_pool::{PoolError, TransactionPool};
use ac_02_proof_of_work::ProofOfWork;
use ac_03_ledger::{Ledger, LedgerDump, LedgerError};
use ac_04_block_transport::BlockTransport;
use ac_05_mining::{MinerDeps, MinerPool, MiningError, MiningSnapshot};
use ac_06_validation::{BlockValidator, ValidationSnapshot, ValidatorPool};
use ac_07_autoscaler::{AutoscalerController, ControllerError};
use ac_08_statistics::{StatisticsCollector, StatisticsReport};
use serde::Serialize;
use shared_bus::{outcome_channel, ShutdownSignal, SignalBus, DEFAULT_OUTCOME_CAPACITY};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ConfigError, NodeConfig};
use crate::generator::TransactionGenerator;

/// Setup failures. All are fatal.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transaction pool setup failed: {0}")]
    Pool(#[from] PoolError),

    #[error("Ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Miner pool setup failed: {0}")]
    Mining(#[from] MiningError),

    #[error("Controller setup failed: {0}")]
    Controller(#[from] ControllerError),
}

/// What remains after an ordered shutdown.
#[derive(Debug, Serialize)]
pub struct ShutdownSummary {
    pub statistics: StatisticsReport,
    pub mining: MiningSnapshot,
    pub validation: ValidationSnapshot,
    pub ledger: LedgerDump,
}

/// A running node.
pub struct Node {
    config: NodeConfig,
    signals: SignalBus,
    pool: Arc<TransactionPool>,
    ledger: Arc<Ledger>,
    transport: Arc<BlockTransport>,
    miners: MinerPool,
    validators: Arc<ValidatorPool>,
    controller: JoinHandle<()>,
    controller_stop: ShutdownSignal,
    generators: Vec<JoinHandle<u64>>,
    collector: JoinHandle<StatisticsReport>,
    collector_drain: ShutdownSignal,
}

impl Node {
    /// Validate `config`, build the shared components and start every role.
    pub fn start(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let signals = SignalBus::new();

        let pool = Arc::new(TransactionPool::new(config.pool_capacity)?);
        let ledger = Arc::new(Ledger::new(config.ledger_capacity)?);
        let transport = Arc::new(BlockTransport::with_buffer(
            config.transactions_per_block,
            config.transport_buffer_bytes,
        ));
        let (outcome_tx, outcome_rx) = outcome_channel(DEFAULT_OUTCOME_CAPACITY);

        let collector_drain = ShutdownSignal::new();
        let collector = tokio::spawn(
            StatisticsCollector::new(outcome_rx, ledger.clone(), signals.clone())
                .run(collector_drain.subscribe()),
        );

        let validator = BlockValidator::new(
            ProofOfWork::new(config.pow_max_operations),
            pool.clone(),
            ledger.clone(),
            signals.clone(),
            outcome_tx,
        );
        let validators = Arc::new(ValidatorPool::start(validator, transport.clone()));

        let miners = MinerPool::start(
            config.miner_config(),
            MinerDeps {
                pool: pool.clone(),
                ledger: ledger.clone(),
                transport: transport.clone(),
                signals: signals.clone(),
            },
        )?;

        let controller_stop = ShutdownSignal::new();
        let controller = AutoscalerController::new(
            config.controller_config(),
            pool.clone(),
            validators.clone(),
            signals.clone(),
        )?;
        let controller = tokio::spawn(controller.run(controller_stop.subscribe()));

        let generators = config
            .generators
            .iter()
            .enumerate()
            .map(|(index, generator)| {
                let generator = TransactionGenerator::new(
                    index,
                    *generator,
                    pool.clone(),
                    config.producer_wait(),
                );
                tokio::spawn(generator.run(signals.shutdown.subscribe()))
            })
            .collect();

        info!(
            miners = config.num_miners,
            pool_capacity = config.pool_capacity,
            per_block = config.transactions_per_block,
            ledger_capacity = config.ledger_capacity,
            transaction_pool_size = config.transaction_pool_size,
            generators = config.generators.len(),
            "[node] 🚀 Anvil-Chain node started"
        );

        Ok(Self {
            config,
            signals,
            pool,
            ledger,
            transport,
            miners,
            validators,
            controller,
            controller_stop,
            generators,
            collector,
            collector_drain,
        })
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn pool(&self) -> &Arc<TransactionPool> {
        &self.pool
    }

    pub fn validators(&self) -> &Arc<ValidatorPool> {
        &self.validators
    }

    /// Ask the statistics collector for a report without stopping.
    pub fn request_report(&self) {
        self.signals.report.request();
    }

    /// Resolve once global shutdown has been requested (ledger full or
    /// [`Node::request_shutdown`]).
    pub async fn stopped(&self) {
        self.signals.shutdown.subscribe().wait().await;
    }

    pub fn request_shutdown(&self) {
        self.signals.shutdown.trigger();
    }

    /// Run the ordered shutdown and return the final statistics and dump.
    pub async fn shutdown(self) -> ShutdownSummary {
        info!("[node] 🛑 Ordered shutdown started");
        self.signals.shutdown.trigger();

        self.controller_stop.trigger();
        if let Err(e) = self.controller.await {
            warn!(error = %e, "[node] controller task ended abnormally");
        }

        self.pool.close();
        for handle in self.generators {
            if let Err(e) = handle.await {
                warn!(error = %e, "[node] generator task ended abnormally");
            }
        }
        let mining_metrics = self.miners.metrics();
        self.miners.shutdown().await;
        let mining = mining_metrics.snapshot();

        self.transport.close().await;
        self.validators.shutdown(self.config.validator_drain()).await;
        let validation = self.validators.validator().metrics().snapshot();

        self.collector_drain.trigger();
        let statistics = match self.collector.await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "[node] statistics task ended abnormally");
                ac_08_statistics::StatisticsAggregator::new()
                    .report(self.ledger.len(), self.ledger.capacity())
            }
        };
        info!("[node] Final statistics\n{statistics}");

        let ledger = self.ledger.dump();
        info!("[node] Ledger dump\n{ledger}");
        if !ledger.chain_is_valid() {
            warn!("[node] ledger chain audit failed");
        }

        info!("[node] Shutdown complete");
        ShutdownSummary {
            statistics,
            mining,
            validation,
            ledger,
        }
    }
}
