//! # Shared Bus - Coordination Signals
//!
//! Every long-lived worker (generators, miners, validators, the controller and
//! the statistics collector) talks to the others through the primitives in
//! this crate. None of them hold references to each other.
//!
//! ## Signal Map
//!
//! ```text
//!                    ┌──────────────────┐
//!   validators ────► │ occupancy_check  │ ───► controller
//!   miners     ────► │  (notify_one)    │
//!                    └──────────────────┘
//!                    ┌──────────────────┐
//!   controller ────► │   miner_wake     │ ───► every miner
//!                    │ (notify_waiters) │
//!                    └──────────────────┘
//!                    ┌──────────────────┐
//!   supervisor ────► │     report       │ ───► statistics collector
//!                    └──────────────────┘
//!                    ┌──────────────────┐
//!   validators ────► │  outcome channel │ ───► statistics collector
//!                    │      (mpsc)      │
//!                    └──────────────────┘
//!                    ┌──────────────────┐
//!   anyone     ────► │    shutdown      │ ───► every loop
//!                    │     (watch)      │
//!                    └──────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod notify;
pub mod outcomes;
pub mod shutdown;

pub use notify::{RequestSignal, WakeBroadcast};
pub use outcomes::{outcome_channel, OutcomeReceiver, OutcomeSender};
pub use shutdown::{ShutdownListener, ShutdownSignal};

use std::sync::Arc;
use thiserror::Error;

/// Default buffer of the outcome channel.
pub const DEFAULT_OUTCOME_CAPACITY: usize = 1024;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The receiving side of a channel was dropped.
    #[error("Channel closed")]
    Closed,
}

/// The signals shared by one node, cloned into every worker.
#[derive(Clone, Debug, Default)]
pub struct SignalBus {
    /// Global stop flag.
    pub shutdown: ShutdownSignal,
    /// Controller → miners: "the pool holds enough transactions".
    pub miner_wake: Arc<WakeBroadcast>,
    /// Miners/validators → controller: "re-sample occupancy now".
    pub occupancy_check: Arc<RequestSignal>,
    /// Supervisor → statistics: "emit a report".
    pub report: Arc<RequestSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }
}
