//! # Collector Task
//!
//! ```text
//!   outcome channel ──► [record] ──► ledger full? ──► final report + global shutdown
//!   report request  ──► [report]
//!   drain request   ──► [try_recv until empty] ──► return final report
//!   all senders gone ─────────────────────────────► return final report
//! ```

use std::sync::Arc;

use ac_03_ledger::Ledger;
use shared_bus::{BusError, OutcomeReceiver, ShutdownListener, SignalBus};
use tracing::{debug, info, warn};

use crate::aggregator::{StatisticsAggregator, StatisticsReport};
use crate::error::{Result, StatisticsError};

/// Single reader of the outcome channel.
#[derive(Debug)]
pub struct StatisticsCollector {
    aggregator: StatisticsAggregator,
    outcomes: OutcomeReceiver,
    ledger: Arc<Ledger>,
    signals: SignalBus,
    full_reported: bool,
}

impl StatisticsCollector {
    pub fn new(outcomes: OutcomeReceiver, ledger: Arc<Ledger>, signals: SignalBus) -> Self {
        Self {
            aggregator: StatisticsAggregator::new(),
            outcomes,
            ledger,
            signals,
            full_reported: false,
        }
    }

    pub fn aggregator(&self) -> &StatisticsAggregator {
        &self.aggregator
    }

    pub fn report(&self) -> StatisticsReport {
        self.aggregator
            .report(self.ledger.len(), self.ledger.capacity())
    }

    /// Report as one JSON document.
    pub fn report_json(&self) -> Result<String> {
        serde_json::to_string(&self.report())
            .map_err(|e| StatisticsError::Serialization(e.to_string()))
    }

    /// Aggregate until every sender is dropped or `drain` fires, then return
    /// the final report. Outcomes already buffered when `drain` fires are
    /// still counted.
    pub async fn run(mut self, mut drain: ShutdownListener) -> StatisticsReport {
        info!("[ac-08] 📊 Statistics collector started");
        let signals = self.signals.clone();
        loop {
            tokio::select! {
                received = self.outcomes.recv() => match received {
                    Some(outcome) => {
                        self.aggregator.record(&outcome);
                        self.check_ledger_full();
                    }
                    None => {
                        debug!("[ac-08] every outcome sender closed");
                        break;
                    }
                },
                _ = signals.report.requested() => self.emit("on-demand"),
                _ = drain.wait() => {
                    self.drain();
                    break;
                }
            }
        }
        let report = self.report();
        info!(
            outcomes = self.aggregator.outcomes(),
            "[ac-08] Statistics collector stopped"
        );
        report
    }

    /// Fold everything already buffered.
    fn drain(&mut self) {
        let mut drained = 0usize;
        loop {
            match self.outcomes.try_recv() {
                Ok(Some(outcome)) => {
                    self.aggregator.record(&outcome);
                    drained += 1;
                }
                Ok(None) | Err(BusError::Closed) => break,
            }
        }
        debug!(drained, "[ac-08] outcome channel drained");
    }

    fn check_ledger_full(&mut self) {
        if self.full_reported || !self.ledger.is_full() {
            return;
        }
        self.full_reported = true;
        self.emit("ledger full");
        if let Err(e) = self.ledger.verify_chain() {
            warn!(error = %e, "[ac-08] chain audit failed on a full ledger");
        }
        info!("[ac-08] 🏁 Ledger full, requesting shutdown");
        self.signals.shutdown.trigger();
    }

    fn emit(&self, reason: &str) {
        info!(reason, "[ac-08] Statistics report\n{}", self.report());
    }
}
