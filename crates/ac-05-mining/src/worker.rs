//! # Miner Worker
//!
//! ```text
//!        ┌──────────────────────────────────────────────────────────────┐
//!        ▼                                                              │
//!   [WAIT wake / recheck] ──► [SELECT] ──► [ASSEMBLE] ──► [MINE] ──► [PUBLISH]
//!        ▲                      │  same selection                │ gave up:
//!        │                      │  and head as last publish      │ fresh timestamp,
//!        └──────────────────────┘  (no check request next time)  └─► MINE again
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ac_02_proof_of_work::{PowResult, ProofOfWork, SearchStatus};
use ac_04_block_transport::{BlockMessage, TransportError};
use shared_bus::ShutdownListener;
use shared_types::{Block, MinerId, Timestamp};
use tracing::{debug, error, info, warn};

use crate::config::MinerConfig;
use crate::metrics::MiningMetrics;
use crate::MinerDeps;

/// Pool-local stop flag combined with the node-wide shutdown.
pub(crate) struct StopListener {
    pub(crate) global: ShutdownListener,
    pub(crate) local: ShutdownListener,
}

impl StopListener {
    fn is_triggered(&self) -> bool {
        self.global.is_triggered() || self.local.is_triggered()
    }

    async fn wait(&mut self) {
        tokio::select! {
            _ = self.global.wait() => {}
            _ = self.local.wait() => {}
        }
    }
}

/// Selection and head of the last published block.
#[derive(Debug, PartialEq, Eq)]
struct Attempt {
    tx_ids: Vec<String>,
    previous_hash: String,
}

enum Step {
    Continue,
    Exit,
}

enum Mined {
    Found(Block, PowResult),
    Abandoned,
    Stopped,
}

enum Published {
    Sent,
    Dropped,
    Stopped,
}

pub(crate) struct MinerWorker {
    id: MinerId,
    config: MinerConfig,
    deps: MinerDeps,
    metrics: Arc<MiningMetrics>,
    cancel: Arc<AtomicBool>,
    stop: StopListener,
    seq: u64,
    last_attempt: Option<Attempt>,
    skip_check_request: bool,
}

impl MinerWorker {
    pub(crate) fn new(
        id: MinerId,
        config: MinerConfig,
        deps: MinerDeps,
        metrics: Arc<MiningMetrics>,
        cancel: Arc<AtomicBool>,
        stop: StopListener,
    ) -> Self {
        Self {
            id,
            config,
            deps,
            metrics,
            cancel,
            stop,
            seq: 0,
            last_attempt: None,
            skip_check_request: false,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(miner = self.id, "[ac-05] ⛏️  Miner started");
        while let Step::Continue = self.iteration().await {}
        info!(miner = self.id, blocks = self.seq, "[ac-05] Miner stopped");
    }

    async fn iteration(&mut self) -> Step {
        if self.stop.is_triggered() {
            return Step::Exit;
        }
        if !self.wait_for_wake().await {
            return Step::Exit;
        }

        let per_block = self.config.transactions_per_block;
        if self.deps.pool.occupied_slots() < per_block {
            return Step::Continue;
        }
        let Some(transactions) = self.deps.pool.select_for_block(per_block) else {
            return Step::Continue;
        };

        let attempt = Attempt {
            tx_ids: transactions.iter().map(|tx| tx.id().to_string()).collect(),
            previous_hash: self.deps.ledger.head_hash(),
        };
        if self.last_attempt.as_ref() == Some(&attempt) {
            self.skip_check_request = true;
            self.metrics.record_skip();
            debug!(miner = self.id, "[ac-05] selection unchanged since last publish, skipping");
            return Step::Continue;
        }

        self.seq += 1;
        let block = match Block::new(
            format!("BLK-{}-{}", self.id, self.seq),
            attempt.previous_hash.clone(),
            Timestamp::now(),
            transactions,
        ) {
            Ok(block) => block,
            Err(e) => {
                warn!(miner = self.id, error = %e, "[ac-05] could not assemble block");
                return Step::Continue;
            }
        };

        let (block, result) = match self.mine(block).await {
            Mined::Found(block, result) => (block, result),
            Mined::Abandoned => return Step::Continue,
            Mined::Stopped => return Step::Exit,
        };

        let message = BlockMessage {
            miner_id: self.id,
            hash: result.hash.clone(),
            block,
        };
        match self.publish(&message).await {
            Published::Sent => {
                self.metrics.record_published();
                self.last_attempt = Some(attempt);
                let event = serde_json::json!({
                    "subsystem_id": "ac-05",
                    "event_type": "BlockPublished",
                    "miner_id": self.id,
                    "block_id": message.block.id,
                    "block_hash": message.hash,
                    "previous_hash": message.block.previous_hash,
                    "metadata": {
                        "nonce": result.nonce,
                        "operations": result.operations,
                        "elapsed_ms": result.elapsed.as_millis() as u64,
                        "difficulty": result.difficulty.to_string(),
                    }
                });
                info!("EVENT_FLOW_JSON {}", event);
                Step::Continue
            }
            Published::Dropped => Step::Continue,
            Published::Stopped => Step::Exit,
        }
    }

    /// Register for the wake broadcast, ask the controller for a check, and
    /// wait. Returns `false` once stopped.
    async fn wait_for_wake(&mut self) -> bool {
        let signals = self.deps.signals.clone();
        let notified = signals.miner_wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.skip_check_request {
            self.skip_check_request = false;
        } else {
            signals.occupancy_check.request();
        }

        let recheck = self.config.recheck_interval;
        tokio::select! {
            _ = notified.as_mut() => true,
            _ = tokio::time::sleep(recheck) => true,
            _ = self.stop.wait() => false,
        }
    }

    /// Run the nonce search on the blocking pool, reassembling with a fresh
    /// timestamp whenever the operation cap is hit.
    async fn mine(&mut self, mut block: Block) -> Mined {
        let pow = ProofOfWork::new(self.config.pow_max_operations);
        loop {
            let cancel = self.cancel.clone();
            let mut search = tokio::task::spawn_blocking(move || {
                let result = pow.mine_cancellable(&mut block, &cancel);
                (block, result)
            });

            let joined = tokio::select! {
                joined = &mut search => joined,
                _ = self.stop.wait() => {
                    self.cancel.store(true, Ordering::Relaxed);
                    return Mined::Stopped;
                }
            };
            let (searched, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!(miner = self.id, error = %e, "[ac-05] search task failed");
                    return Mined::Abandoned;
                }
            };

            match result.status {
                SearchStatus::Found => {
                    self.metrics
                        .record_search(result.operations, result.elapsed, false);
                    debug!(
                        miner = self.id,
                        block = %searched.id,
                        nonce = result.nonce,
                        "[ac-05] proof found"
                    );
                    return Mined::Found(searched, result);
                }
                SearchStatus::GaveUp => {
                    self.metrics
                        .record_search(result.operations, result.elapsed, true);
                    warn!(
                        miner = self.id,
                        block = %searched.id,
                        operations = result.operations,
                        "[ac-05] operation cap reached, retrying with a fresh timestamp"
                    );
                    block = searched;
                    block.timestamp = Timestamp::now();
                    block.nonce = 0;
                }
                SearchStatus::Cancelled => return Mined::Stopped,
            }
        }
    }

    /// Write the block, retrying transient failures until stopped.
    async fn publish(&mut self, message: &BlockMessage) -> Published {
        loop {
            let sent = tokio::select! {
                sent = self.deps.transport.send(message) => sent,
                _ = self.stop.wait() => return Published::Stopped,
            };
            match sent {
                Ok(()) => return Published::Sent,
                Err(TransportError::Closed) => return Published::Stopped,
                Err(e) if e.is_recoverable() => {
                    self.metrics.record_send_retry();
                    warn!(miner = self.id, error = %e, "[ac-05] transport write failed, retrying");
                    let retry = self.config.retry_interval;
                    tokio::select! {
                        _ = tokio::time::sleep(retry) => {}
                        _ = self.stop.wait() => return Published::Stopped,
                    }
                }
                Err(e) => {
                    error!(miner = self.id, error = %e, "[ac-05] block dropped");
                    return Published::Dropped;
                }
            }
        }
    }
}
