//! # Validator Pool
//!
//! Slot 0 holds the base validator, started with the pool and never retired
//! by scaling. Slots 1 and 2 hold auxiliary validators started and retired
//! by [`ValidatorPool::scale_to`].
//!
//! A retired worker finishes the block it is processing before it exits; its
//! slot may be refilled immediately with a fresh worker.

use std::sync::Arc;
use std::time::Duration;

use ac_04_block_transport::BlockTransport;
use parking_lot::Mutex;
use shared_bus::ShutdownSignal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::{StateCell, ValidatorState};
use crate::validator::BlockValidator;
use crate::worker::ValidatorWorker;
use crate::{MAX_VALIDATORS, MIN_VALIDATORS};

#[derive(Debug)]
struct WorkerSlot {
    stop: ShutdownSignal,
    state: Arc<StateCell>,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct PoolInner {
    slots: [Option<WorkerSlot>; MAX_VALIDATORS],
    retiring: Vec<(usize, JoinHandle<()>)>,
}

impl PoolInner {
    /// Assigned workers whose task is still running.
    fn running(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|w| !w.handle.is_finished())
            .count()
    }
}

/// Supervised set of validator workers reading one transport.
#[derive(Debug)]
pub struct ValidatorPool {
    validator: BlockValidator,
    transport: Arc<BlockTransport>,
    inner: Mutex<PoolInner>,
}

impl ValidatorPool {
    /// Create the pool and start the base validator.
    pub fn start(validator: BlockValidator, transport: Arc<BlockTransport>) -> Self {
        let pool = Self {
            validator,
            transport,
            inner: Mutex::new(PoolInner::default()),
        };
        {
            let mut inner = pool.inner.lock();
            inner.slots[0] = Some(pool.spawn(0));
        }
        pool
    }

    fn spawn(&self, slot: usize) -> WorkerSlot {
        let stop = ShutdownSignal::new();
        let state = Arc::new(StateCell::default());
        let worker = ValidatorWorker {
            slot,
            validator: self.validator.clone(),
            transport: self.transport.clone(),
            state: state.clone(),
            stop: stop.subscribe(),
        };
        WorkerSlot {
            stop,
            state,
            handle: tokio::spawn(worker.run()),
        }
    }

    pub fn validator(&self) -> &BlockValidator {
        &self.validator
    }

    /// Number of slot workers still running. A worker that exited on its
    /// own (transport closed, fatal error) is not counted.
    pub fn active(&self) -> usize {
        self.inner.lock().running()
    }

    /// Current state of each occupied slot.
    pub fn states(&self) -> Vec<(usize, ValidatorState)> {
        self.inner
            .lock()
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|w| (i, w.state.get())))
            .collect()
    }

    /// Resize to `target` workers, clamped to `1..=3`. Missing auxiliaries
    /// start in slot order; surplus ones retire from the highest slot down.
    /// Returns the resulting size.
    pub fn scale_to(&self, target: usize) -> usize {
        let target = target.clamp(MIN_VALIDATORS, MAX_VALIDATORS);
        let mut inner = self.inner.lock();
        inner.retiring.retain(|(_, handle)| !handle.is_finished());

        let before = inner.running();
        for slot in 1..MAX_VALIDATORS {
            if slot < target && inner.slots[slot].is_none() {
                inner.slots[slot] = Some(self.spawn(slot));
                info!(validator = slot, "[ac-06] ➕ Auxiliary validator started");
            }
        }
        for slot in (target..MAX_VALIDATORS).rev() {
            if let Some(worker) = inner.slots[slot].take() {
                worker.stop.trigger();
                inner.retiring.push((slot, worker.handle));
                info!(validator = slot, "[ac-06] ➖ Auxiliary validator retiring");
            }
        }

        let after = inner.running();
        if before != after {
            info!(before, after, "[ac-06] Validator pool resized");
        }
        after
    }

    /// Wait up to `drain` for every worker to finish on its own (the
    /// transport must already be closed), then stop the rest.
    pub async fn shutdown(&self, drain: Duration) {
        let (stops, mut handles) = {
            let mut inner = self.inner.lock();
            let mut stops = Vec::new();
            let mut handles = Vec::new();
            for (slot, worker) in inner.slots.iter_mut().enumerate() {
                if let Some(worker) = worker.take() {
                    stops.push(worker.stop);
                    handles.push((slot, worker.handle));
                }
            }
            handles.append(&mut inner.retiring);
            (stops, handles)
        };

        let drained = tokio::time::timeout(drain, async {
            for (_, handle) in handles.iter_mut() {
                if let Err(e) = handle.await {
                    warn!(error = %e, "[ac-06] validator task ended abnormally");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(?drain, "[ac-06] validators did not drain in time, stopping them");
            for stop in &stops {
                stop.trigger();
            }
            for (slot, handle) in handles {
                if handle.is_finished() {
                    continue;
                }
                if let Err(e) = handle.await {
                    warn!(validator = slot, error = %e, "[ac-06] validator task ended abnormally");
                }
            }
        }
        info!(
            committed = self.validator.metrics().snapshot().blocks_committed,
            "[ac-06] Validator pool stopped"
        );
    }
}
