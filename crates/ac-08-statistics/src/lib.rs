//! # Statistics (ac-08)
//!
//! The single reader of the validation outcome channel. It keeps per-miner
//! counts of valid and invalid blocks, cumulative credits and a running
//! average of block latency (validation time minus block creation time).
//!
//! ## Reports
//!
//! | Trigger | Effect |
//! |---------|--------|
//! | `SignalBus::report` request (SIGUSR1) | report logged, node keeps running |
//! | Ledger becomes full | report logged, global shutdown requested |
//! | Drain request or all senders gone | collector returns the final report |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod aggregator;
pub mod collector;
pub mod error;

pub use aggregator::{MinerStats, StatisticsAggregator, StatisticsReport};
pub use collector::StatisticsCollector;
pub use error::{Result, StatisticsError};
