//! # Node Runtime Library
//!
//! Configuration, transaction generators and the supervisor of an
//! Anvil-Chain node. The binary in `main.rs` adds logging setup and signal
//! handling on top.
//!
//! ## Roles
//!
//! | Role | Crate | Count |
//! |------|-------|-------|
//! | Transaction generator | this crate | one per `generators` entry |
//! | Miner | `ac-05-mining` | `num_miners` |
//! | Validator | `ac-06-validation` | 1 to 3, autoscaled |
//! | Controller | `ac-07-autoscaler` | 1 |
//! | Statistics collector | `ac-08-statistics` | 1 |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod generator;
pub mod supervisor;

pub use config::{ConfigError, GeneratorConfig, NodeConfig};
pub use generator::TransactionGenerator;
pub use supervisor::{Node, NodeError, ShutdownSummary};
