//! # Ledger (ac-03)
//!
//! Fixed-capacity, append-only sequence of committed blocks plus the cached
//! head hash miners build on.
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Append-only | A committed slot is never overwritten or cleared |
//! | First empty slot | Appends fill slots by linear scan |
//! | Linkage | Every block after the first links to the previous head |
//! | Head cache | `head_hash` equals the last committed hash, or genesis |
//!
//! ## Lock Order
//!
//! ```text
//! Pool (ac-01) ──→ Ledger blocks ──→ Head hash
//! ```
//!
//! Validators append from inside `TransactionPool::consume_with`, so the pool
//! lock is already held when `append` takes the ledger locks.

pub mod dump;
pub mod errors;
pub mod ledger;

pub use dump::LedgerDump;
pub use errors::{LedgerError, Result};
pub use ledger::{CommittedBlock, Ledger};
