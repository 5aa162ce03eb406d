//! # Anvil-Chain Test Suite
//!
//! Cross-component scenarios that need more than one crate wired together.
//! Unit tests stay next to the code they cover.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs      # shared wiring (pool, ledger, transport, validators)
//!     ├── pipeline.rs      # publish → mine → validate → commit
//!     ├── autoscaling.rs   # occupancy thresholds against a real validator pool
//!     └── node.rs          # full supervisor run until the ledger is full
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ac-tests
//! cargo test -p ac-tests integration::autoscaling::
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod integration;
