//! # Autoscaler (ac-07)
//!
//! One control loop samples pool occupancy every interval (default 2 s) or
//! when a miner or validator asks for a check. Each cycle:
//!
//! 1. wakes every miner when at least `transactions_per_block` slots are
//!    occupied, and
//! 2. resizes the validator pool with [`ScalePolicy`].
//!
//! The loop honours shutdown between cycles only.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod controller;
pub mod error;
pub mod policy;
pub mod ports;

pub use controller::{AutoscalerController, ControllerConfig, CycleReport, DEFAULT_INTERVAL};
pub use error::{ControllerError, Result};
pub use policy::ScalePolicy;
pub use ports::WorkerScaler;
