//! # Mining (ac-05)
//!
//! A fixed pool of miner workers. Each worker waits for the controller's
//! wake-up broadcast, selects `T` transactions from the pool, assembles a
//! block on top of the current ledger head, searches for a nonce and writes
//! the finished block to the transport.
//!
//! ## Worker Loop
//!
//! ```text
//!  ┌────────────┐  wake / recheck  ┌──────────┐    ┌───────────┐    ┌──────────┐
//!  │   WAIT     │ ───────────────► │  SELECT  │ ─► │   MINE    │ ─► │ PUBLISH  │
//!  │ (+request  │                  │ (pool    │    │ (blocking │    │ (writer  │
//!  │  a check)  │ ◄─────────────── │  lock)   │    │  pool)    │    │  lock)   │
//!  └────────────┘   too few txs /  └──────────┘    └───────────┘    └──────────┘
//!                   same as last publish
//! ```
//!
//! ## Shared Resources
//!
//! | Resource | Access | Lock |
//! |----------|--------|------|
//! | Transaction pool | read-only selection | pool lock |
//! | Ledger head | read | head lock |
//! | Transport | write one frame | writer lock |
//!
//! Miners never remove transactions: the validator consumes them on commit.
//! Two miners may therefore race on the same selection; the slower block is
//! rejected as stale.
//!
//! ## Shutdown
//!
//! [`MinerPool::shutdown`] (or the node-wide shutdown) stops the loops, sets
//! the search cancel flag so in-flight searches return within a few thousand
//! nonces, and joins every worker.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
mod worker;

pub use config::MinerConfig;
pub use error::{MiningError, Result};
pub use metrics::{MiningMetrics, MiningSnapshot};
pub use pool::{MinerDeps, MinerPool};
