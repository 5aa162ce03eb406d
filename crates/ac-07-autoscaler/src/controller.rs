//! # Control Loop
//!
//! ```text
//!   ┌──────────── interval tick ────────────┐
//!   │                                       ▼
//!   │   occupancy_check request ──► [SAMPLE pool] ──► occupied ≥ T ? ──► wake miners
//!   │                                       │
//!   │                                       ▼
//!   └─────────────────────────────── [SCALE validators]
//! ```

use std::sync::Arc;
use std::time::Duration;

use ac_01_tx_pool::TransactionPool;
use serde::{Deserialize, Serialize};
use shared_bus::{ShutdownListener, SignalBus};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::{ControllerError, Result};
use crate::policy::ScalePolicy;
use crate::ports::WorkerScaler;

/// Default sampling interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Runtime configuration for the controller
#[derive(Clone, Debug, Deserialize)]
pub struct ControllerConfig {
    pub interval: Duration,
    /// Minimum occupied slots before miners are woken
    pub transactions_per_block: usize,
    pub policy: ScalePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            transactions_per_block: 3,
            policy: ScalePolicy::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ControllerError::ZeroInterval);
        }
        if self.transactions_per_block == 0 {
            return Err(ControllerError::ZeroBlockSize);
        }
        self.policy.validate()
    }
}

/// What one control cycle observed and did
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CycleReport {
    pub occupied: usize,
    pub capacity: usize,
    pub occupancy_percent: f64,
    pub woke_miners: bool,
    pub validators_before: usize,
    pub validators_after: usize,
}

/// Occupancy-driven controller
pub struct AutoscalerController<S: WorkerScaler> {
    config: ControllerConfig,
    pool: Arc<TransactionPool>,
    scaler: S,
    signals: SignalBus,
    cycles: u64,
}

impl<S: WorkerScaler> AutoscalerController<S> {
    pub fn new(
        config: ControllerConfig,
        pool: Arc<TransactionPool>,
        scaler: S,
        signals: SignalBus,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool,
            scaler,
            signals,
            cycles: 0,
        })
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Sample occupancy once, wake miners if a block can be assembled, and
    /// apply the scale policy.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let occupied = self.pool.occupied_slots();
        let capacity = self.pool.capacity();
        let occupancy_percent = self.pool.occupancy_percent();

        let woke_miners = occupied >= self.config.transactions_per_block;
        if woke_miners {
            let generation = self.signals.miner_wake.wake_all();
            debug!(occupied, generation, "[ac-07] miners woken");
        }

        let validators_before = self.scaler.current_workers();
        let desired = self.config.policy.desired(occupancy_percent, validators_before);
        let validators_after = if desired == validators_before {
            validators_before
        } else {
            let after = self.scaler.scale_to(desired);
            info!(
                occupancy = format!("{occupancy_percent:.1}%"),
                before = validators_before,
                after,
                "[ac-07] ⚖️  Validator pool rescaled"
            );
            after
        };

        CycleReport {
            occupied,
            capacity,
            occupancy_percent,
            woke_miners,
            validators_before,
            validators_after,
        }
    }

    /// Loop until shutdown. Each iteration is triggered by the interval or
    /// an occupancy check request and runs to completion.
    pub async fn run(mut self, mut shutdown: ShutdownListener) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "[ac-07] 🎛️  Controller started"
        );
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let signals = self.signals.clone();

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
                _ = signals.occupancy_check.requested() => {}
            }
            let report = self.run_cycle();
            debug!(
                occupied = report.occupied,
                capacity = report.capacity,
                validators = report.validators_after,
                "[ac-07] cycle complete"
            );
            if shutdown.is_triggered() {
                break;
            }
        }
        info!(cycles = self.cycles, "[ac-07] Controller stopped");
    }
}
