//! # Block Transport (ac-04)
//!
//! Carries fully mined blocks from miners to validators as fixed-size binary
//! frames over one shared byte stream.
//!
//! ```text
//!  miner 1 ─┐                                          ┌─► validator (base)
//!  miner 2 ─┼─► [writer lock] ══ duplex pipe ══ [reader lock] ─┼─► validator (aux 1)
//!  miner N ─┘                                          └─► validator (aux 2)
//! ```
//!
//! ## Failure Semantics
//!
//! | Condition | Error | Worker reaction |
//! |-----------|-------|-----------------|
//! | Write side closed | `Closed` | miner exits / validator exits |
//! | EOF inside a frame | `Malformed` | validator exits |
//! | Undecodable frame | `Malformed` | validator exits |
//! | Other I/O failure | `Io` | miner retries after a delay |

pub mod codec;
pub mod transport;

pub use codec::{decode, encode, frame_size, BlockMessage, CodecError, FRAME_HEADER_LEN};
pub use transport::BlockTransport;

use thiserror::Error;

/// Default pipe buffer.
pub const DEFAULT_BUFFER_BYTES: usize = 64 * 1024;

/// Transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Malformed frame: {0}")]
    Malformed(#[from] CodecError),

    #[error("Transport I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Whether the caller should retry after a short delay.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Whether the channel is finished for readers.
    pub fn ends_stream(&self) -> bool {
        matches!(self, Self::Closed | Self::Malformed(_))
    }
}
