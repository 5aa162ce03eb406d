//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `Transaction`, `Block`
//! - **Reporting**: `ValidationOutcome`
//! - **Time**: `Timestamp` (milliseconds since the UNIX epoch)

use std::fmt;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding::{ByteReader, ByteWriter};
use crate::errors::{Result, TypesError};
use crate::{BLOCK_ID_LEN, HASH_HEX_LEN, MAX_REWARD, MIN_REWARD, TX_ID_LEN};

/// Identifier of a miner worker (1-based).
pub type MinerId = u32;

// =============================================================================
// TIME
// =============================================================================

/// Wall-clock instant in milliseconds since the UNIX epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis().max(0) as u64)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Utc.timestamp_millis_opt(self.0 as i64).single() {
            Some(dt) => write!(f, "{}", dt.format("%d/%m/%Y %H:%M:%S%.3f")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

fn validate_identifier(kind: &'static str, id: &str, max_len: usize) -> Result<()> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id.len() > max_len {
        "too long for its fixed-width field"
    } else if id.as_bytes().contains(&0) {
        "must not contain NUL bytes"
    } else {
        return Ok(());
    };
    Err(TypesError::InvalidIdentifier {
        kind,
        id: id.to_string(),
        reason,
    })
}

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A pending value transfer. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    reward: u8,
    sender_id: u32,
    receiver_id: u32,
    value: f64,
    timestamp: Timestamp,
}

impl Transaction {
    /// Size of one encoded transaction.
    pub const ENCODED_LEN: usize = TX_ID_LEN + 1 + 4 + 4 + 8 + 8;

    /// Build a transaction, rejecting rewards outside 1..=3 and malformed ids.
    pub fn new(
        id: impl Into<String>,
        reward: u8,
        sender_id: u32,
        receiver_id: u32,
        value: f64,
        timestamp: Timestamp,
    ) -> Result<Self> {
        let id = id.into();
        validate_identifier("transaction", &id, TX_ID_LEN)?;
        if !(MIN_REWARD..=MAX_REWARD).contains(&reward) {
            return Err(TypesError::InvalidReward(reward));
        }
        Ok(Self {
            id,
            reward,
            sender_id,
            receiver_id,
            value,
            timestamp,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reward(&self) -> u8 {
        self.reward
    }

    pub fn sender_id(&self) -> u32 {
        self.sender_id
    }

    pub fn receiver_id(&self) -> u32 {
        self.receiver_id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Append the canonical encoding (`ENCODED_LEN` bytes).
    pub fn write_bytes(&self, w: &mut ByteWriter) {
        w.put_fixed_str(&self.id, TX_ID_LEN);
        w.put_u8(self.reward);
        w.put_u32(self.sender_id);
        w.put_u32(self.receiver_id);
        w.put_f64(self.value);
        w.put_u64(self.timestamp.as_millis());
    }

    /// Decode one transaction, re-applying construction checks.
    pub fn read_bytes(r: &mut ByteReader<'_>) -> Result<Self> {
        let id = r.get_fixed_str(TX_ID_LEN, "transaction.id")?;
        let reward = r.get_u8()?;
        let sender_id = r.get_u32()?;
        let receiver_id = r.get_u32()?;
        let value = r.get_f64()?;
        let timestamp = Timestamp::from_millis(r.get_u64()?);
        Self::new(id, reward, sender_id, receiver_id, value, timestamp)
    }
}

/// A candidate or committed block.
///
/// Fields are public: miners rewrite `timestamp`/`nonce` during the search.
/// After the proof is found the block is treated as read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub previous_hash: String,
    pub timestamp: Timestamp,
    pub nonce: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Assemble a block with nonce 0.
    pub fn new(
        id: impl Into<String>,
        previous_hash: impl Into<String>,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
    ) -> Result<Self> {
        let id = id.into();
        validate_identifier("block", &id, BLOCK_ID_LEN)?;
        Ok(Self {
            id,
            previous_hash: previous_hash.into(),
            timestamp,
            nonce: 0,
            transactions,
        })
    }

    /// Highest reward among the block's transactions (0 for an empty block).
    pub fn max_reward(&self) -> u8 {
        self.transactions
            .iter()
            .map(Transaction::reward)
            .max()
            .unwrap_or(0)
    }

    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.transactions.iter().map(Transaction::id)
    }

    /// Append every hashed field except the nonce: id, previous hash,
    /// timestamp and the transaction list.
    pub fn write_hash_prefix(&self, w: &mut ByteWriter) {
        w.put_fixed_str(&self.id, BLOCK_ID_LEN);
        w.put_fixed_str(&self.previous_hash, HASH_HEX_LEN);
        w.put_u64(self.timestamp.as_millis());
        for tx in &self.transactions {
            tx.write_bytes(w);
        }
    }
}

// =============================================================================
// CLUSTER B: REPORTING
// =============================================================================

/// Result of one validation attempt, sent once per received block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub miner_id: MinerId,
    pub valid: bool,
    /// Reward credited to the miner (0 when invalid).
    pub credits: u32,
    /// Block creation time (the block timestamp).
    pub created_at: Timestamp,
    pub validated_at: Timestamp,
}

impl ValidationOutcome {
    /// Time between block creation and validation.
    pub fn latency(&self) -> Duration {
        self.validated_at.saturating_since(self.created_at)
    }
}
