//! # Shared Types Crate
//!
//! Domain entities used by every Anvil-Chain subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Transaction`, `Block` and
//!   `ValidationOutcome` are defined once, here.
//! - **Canonical Encoding**: the byte layout hashed by the proof-of-work
//!   engine and the layout carried by the block transport share the same
//!   field writers (`encoding`), so a block hashes identically on both sides
//!   of the pipe.
//! - **Immutable Transactions**: a `Transaction` has no setters; once
//!   published it is only ever copied.

pub mod encoding;
pub mod entities;
pub mod errors;

pub use encoding::{ByteReader, ByteWriter};
pub use entities::*;
pub use errors::{Result, TypesError};

/// Hash of the (virtual) block preceding the first committed block.
pub const GENESIS_HASH: &str = "00006a8e76f31ba74e21a092cca1015a418c9d5f4375e7a4fec676e1d2ec1436";

/// Length of a hex-encoded SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Maximum length (bytes) of a transaction identifier.
pub const TX_ID_LEN: usize = 32;

/// Maximum length (bytes) of a block identifier.
pub const BLOCK_ID_LEN: usize = 32;

/// Lowest transaction reward.
pub const MIN_REWARD: u8 = 1;

/// Highest transaction reward.
pub const MAX_REWARD: u8 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_hash_shape() {
        assert_eq!(GENESIS_HASH.len(), HASH_HEX_LEN);
        assert!(GENESIS_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
