//! # Error Types
//!
//! Errors raised while constructing or decoding shared entities.

use thiserror::Error;

/// Result type alias for shared-type operations.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors that can occur while building or decoding shared entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Transaction reward outside the accepted range.
    #[error("Invalid reward {0}: must be between 1 and 3")]
    InvalidReward(u8),

    /// Identifier is empty or does not fit its fixed-width field.
    #[error("Invalid {kind} identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// Which identifier ("transaction" or "block").
        kind: &'static str,
        /// The offending identifier.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Input ended before a field could be read.
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required by the next field.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// A fixed-width string field is not valid UTF-8.
    #[error("Field '{0}' is not valid UTF-8")]
    InvalidUtf8(&'static str),
}
