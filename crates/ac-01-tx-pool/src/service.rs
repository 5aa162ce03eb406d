//! # Pool Service
//!
//! Thread-safe wrapper around [`SlotTable`]: one pool-wide lock for every
//! mutation, a counting semaphore of free slots for producers, and an atomic
//! occupied counter for lock-free occupancy reads.
//!
//! ## Permit Accounting
//!
//! ```text
//! available permits = capacity - occupied - outstanding reservations
//! ```
//!
//! A reservation holds one permit. Publishing consumes it (`forget`), dropping
//! the reservation returns it. Releasing a slot adds one permit back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::Transaction;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, trace};

use crate::domain::{ConsumeError, PoolError, Result, SelectionPolicy, SlotTable};

/// Shared bounded transaction pool.
#[derive(Debug)]
pub struct TransactionPool {
    table: Mutex<SlotTable>,
    free_slots: Semaphore,
    occupied: AtomicUsize,
    capacity: usize,
    policy: SelectionPolicy,
}

impl TransactionPool {
    /// Create a pool with the default (easiest-first) policy.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_policy(capacity, SelectionPolicy::default())
    }

    pub fn with_policy(capacity: usize, policy: SelectionPolicy) -> Result<Self> {
        let table = SlotTable::new(capacity)?;
        Ok(Self {
            table: Mutex::new(table),
            free_slots: Semaphore::new(capacity),
            occupied: AtomicUsize::new(0),
            capacity,
            policy,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn occupied_slots(&self) -> usize {
        self.occupied.load(Ordering::Acquire)
    }

    /// `occupied / capacity * 100`.
    pub fn occupancy_percent(&self) -> f64 {
        self.occupied_slots() as f64 / self.capacity as f64 * 100.0
    }

    pub fn is_closed(&self) -> bool {
        self.free_slots.is_closed()
    }

    /// Wait up to `wait` for a free slot.
    pub async fn try_reserve_slot(&self, wait: Duration) -> Result<SlotReservation<'_>> {
        match tokio::time::timeout(wait, self.free_slots.acquire()).await {
            Ok(Ok(permit)) => Ok(SlotReservation { pool: self, permit }),
            Ok(Err(_)) => Err(PoolError::Closed),
            Err(_) => Err(PoolError::Timeout(wait)),
        }
    }

    /// Reserve a slot (bounded wait) and publish `tx` into it.
    pub async fn publish(&self, tx: Transaction, wait: Duration) -> Result<usize> {
        self.try_reserve_slot(wait).await?.publish(tx)
    }

    /// Select `count` transactions for a block under the pool policy.
    pub fn select_for_block(&self, count: usize) -> Option<Vec<Transaction>> {
        self.select_with_policy(count, self.policy)
    }

    pub fn select_with_policy(
        &self,
        count: usize,
        policy: SelectionPolicy,
    ) -> Option<Vec<Transaction>> {
        let selection = self.table.lock().select(count, policy);
        trace!(count, found = selection.is_some(), "[ac-01] selection scan");
        selection
    }

    /// Increment the age of every occupied slot.
    pub fn age_all(&self) {
        self.table.lock().age_all();
    }

    /// Free the slot holding `id` and wake one producer. Idempotent.
    pub fn release(&self, id: &str) -> bool {
        let released = {
            let mut table = self.table.lock();
            let released = table.release(id);
            if released {
                self.occupied.fetch_sub(1, Ordering::AcqRel);
            }
            released
        };
        if released {
            self.free_slots.add_permits(1);
            debug!(tx = id, "[ac-01] slot released");
        }
        released
    }

    pub fn contains_all<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        self.table.lock().contains_all(ids)
    }

    /// Under the pool lock: require every id to be pending, run `commit`, and
    /// on success release all ids.
    ///
    /// Nothing is released when the membership check or `commit` fails.
    pub fn consume_with<'a, T, E, F>(
        &self,
        ids: &[&'a str],
        commit: F,
    ) -> std::result::Result<T, ConsumeError<E>>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let (value, freed) = {
            let mut table = self.table.lock();
            if let Some(missing) = table.first_missing(ids.iter().copied()) {
                return Err(ConsumeError::Missing(missing.to_string()));
            }
            let value = commit().map_err(ConsumeError::Commit)?;
            let freed = ids.iter().filter(|id| table.release(id)).count();
            self.occupied.fetch_sub(freed, Ordering::AcqRel);
            (value, freed)
        };
        self.free_slots.add_permits(freed);
        debug!(freed, "[ac-01] transactions consumed by commit");
        Ok(value)
    }

    /// Run `f` against the slot table under the lock (inspection only).
    pub fn inspect<R>(&self, f: impl FnOnce(&SlotTable) -> R) -> R {
        f(&self.table.lock())
    }

    /// Close the free-slot semaphore; blocked producers fail with `Closed`.
    pub fn close(&self) {
        self.free_slots.close();
        debug!("[ac-01] pool closed to producers");
    }
}

/// A held free-slot permit. Dropping it without publishing returns the slot.
#[derive(Debug)]
pub struct SlotReservation<'a> {
    pool: &'a TransactionPool,
    permit: SemaphorePermit<'a>,
}

impl SlotReservation<'_> {
    /// Copy `tx` into a free slot, consuming the reservation.
    pub fn publish(self, tx: Transaction) -> Result<usize> {
        let id = tx.id().to_string();
        let index = {
            let mut table = self.pool.table.lock();
            let index = table.insert(tx)?;
            self.pool.occupied.fetch_add(1, Ordering::AcqRel);
            index
        };
        self.permit.forget();
        debug!(tx = %id, slot = index, "[ac-01] transaction published");
        Ok(index)
    }
}
