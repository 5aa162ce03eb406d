//! # Transaction Pool Subsystem
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Bounded shared buffer of pending transactions. Producers (generators) wait
//! for a free slot, miners select batches for block assembly, validators
//! release the transactions of committed blocks.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `0 <= occupied <= capacity` | `SlotTable::insert` + free-slot semaphore |
//! | No occupied slot is overwritten | `insert` scans for the first free slot |
//! | No duplicate ids | `insert` membership check |
//! | `selected` marks never escape a call | `SlotTable::select` clears them |
//! | Release is idempotent | unknown ids are a no-op |
//!
//! ## Lifecycle of a slot
//!
//! ```text
//! [FREE] ──reserve+publish──→ [OCCUPIED(age)] ──release / consume_with──→ [FREE]
//!                                   │    ▲
//!                                   └────┘ select (age += 1)
//! ```
//!
//! ## Lock Order
//!
//! The pool lock is the outermost lock of the node. `consume_with` runs the
//! caller's commit (the ledger append) while holding it.

pub mod domain;
pub mod service;

pub use domain::{ConsumeError, PoolError, PoolSlot, Result, SelectionPolicy, SlotTable};
pub use service::{SlotReservation, TransactionPool};
