//! # Domain Layer - Transaction Pool
//!
//! - `slots`: the fixed slot array, selection policy and aging
//! - `errors`: `PoolError`, `ConsumeError`

pub mod errors;
pub mod slots;

pub use errors::*;
pub use slots::*;
