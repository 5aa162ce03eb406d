//! # Slot Table
//!
//! Fixed array of `capacity` slots. Pure data structure: the service layer
//! wraps it in the pool-wide lock and keeps the free-slot semaphore in step.
//!
//! ## Selection
//!
//! `select` ages every occupied slot, then marks up to `count` slots as
//! `selected` according to the policy. Marks are cleared before it returns,
//! so no caller ever observes another caller's marks.
//!
//! | Policy | Pass 1 | Pass 2 |
//! |--------|--------|--------|
//! | `EasiestFirst` | reward-1 slots in slot order | remaining slots in slot order |
//! | `FirstAvailable` | all slots in slot order | - |

use super::errors::{PoolError, Result};
use shared_types::Transaction;

/// One slot of the pool.
#[derive(Clone, Debug, Default)]
pub struct PoolSlot {
    transaction: Option<Transaction>,
    age: u64,
    selected: bool,
}

impl PoolSlot {
    pub fn is_occupied(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Number of selection scans this transaction has survived.
    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    fn holds(&self, id: &str) -> bool {
        self.transaction.as_ref().is_some_and(|tx| tx.id() == id)
    }
}

/// Priority policy for block assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Reward-1 transactions first, then first-available.
    #[default]
    EasiestFirst,
    /// Slot order only.
    FirstAvailable,
}

/// The slot array plus its occupied count.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<PoolSlot>,
    occupied: usize,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![PoolSlot::default(); capacity],
            occupied: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.iter().any(|slot| slot.holds(id))
    }

    pub fn contains_all<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        ids.into_iter().all(|id| self.contains(id))
    }

    /// First id in `ids` that is not pending.
    pub fn first_missing<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
        ids.into_iter().find(|id| !self.contains(id))
    }

    /// Copy `tx` into the first free slot. Returns the slot index.
    pub fn insert(&mut self, tx: Transaction) -> Result<usize> {
        if self.contains(tx.id()) {
            return Err(PoolError::DuplicateTransaction(tx.id().to_string()));
        }
        let index = self
            .slots
            .iter()
            .position(|slot| !slot.is_occupied())
            .ok_or(PoolError::Full {
                capacity: self.slots.len(),
            })?;

        self.slots[index] = PoolSlot {
            transaction: Some(tx),
            age: 0,
            selected: false,
        };
        self.occupied += 1;
        Ok(index)
    }

    /// Free the slot holding `id`. Unknown ids are a no-op.
    pub fn release(&mut self, id: &str) -> bool {
        match self.slots.iter_mut().find(|slot| slot.holds(id)) {
            Some(slot) => {
                *slot = PoolSlot::default();
                self.occupied -= 1;
                true
            }
            None => false,
        }
    }

    pub fn age_all(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_occupied()) {
            slot.age = slot.age.saturating_add(1);
        }
    }

    /// Choose `count` transactions, or `None` if fewer are pending.
    pub fn select(&mut self, count: usize, policy: SelectionPolicy) -> Option<Vec<Transaction>> {
        self.age_all();
        if count == 0 || self.occupied < count {
            return None;
        }

        let mut chosen = Vec::with_capacity(count);
        if policy == SelectionPolicy::EasiestFirst {
            self.mark(count, &mut chosen, |tx| tx.reward() == 1);
        }
        self.mark(count, &mut chosen, |_| true);

        let picked = chosen
            .iter()
            .filter_map(|&i| self.slots[i].transaction.clone())
            .collect::<Vec<_>>();
        for &i in &chosen {
            self.slots[i].selected = false;
        }

        (picked.len() == count).then_some(picked)
    }

    fn mark(&mut self, count: usize, chosen: &mut Vec<usize>, eligible: impl Fn(&Transaction) -> bool) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if chosen.len() == count {
                return;
            }
            let Some(tx) = slot.transaction.as_ref() else {
                continue;
            };
            if !slot.selected && eligible(tx) {
                slot.selected = true;
                chosen.push(i);
            }
        }
    }
}
