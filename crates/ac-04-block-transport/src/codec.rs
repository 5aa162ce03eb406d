//! # Frame Codec
//!
//! ```text
//! ┌──────────┬────────────┬─────────────┬───────────────┬───────────┬──────────┬─────────────────┐
//! │ miner u32│ hash [64]  │ blockId [32]│ previous [64] │ ts u64    │ nonce u64│ txs × 57 bytes  │
//! └──────────┴────────────┴─────────────┴───────────────┴───────────┴──────────┴─────────────────┘
//! ```
//!
//! All integers little-endian, strings NUL-padded. The frame carries no
//! length or count: both ends agree on transactions-per-block up front.

use shared_types::{
    Block, ByteReader, ByteWriter, MinerId, Timestamp, Transaction, TypesError, BLOCK_ID_LEN,
    HASH_HEX_LEN,
};
use thiserror::Error;

/// Bytes before the transaction list.
pub const FRAME_HEADER_LEN: usize = 4 + HASH_HEX_LEN + BLOCK_ID_LEN + HASH_HEX_LEN + 8 + 8;

/// Size of a frame carrying `tx_count` transactions.
pub const fn frame_size(tx_count: usize) -> usize {
    FRAME_HEADER_LEN + tx_count * Transaction::ENCODED_LEN
}

/// A mined block on its way to a validator.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMessage {
    pub miner_id: MinerId,
    /// Digest claimed by the miner.
    pub hash: String,
    pub block: Block,
}

/// Frame encoding/decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Expected {expected} transactions per block, got {found}")]
    WrongTransactionCount { expected: usize, found: usize },

    #[error("Expected a {expected}-byte frame, got {found} bytes")]
    WrongFrameLength { expected: usize, found: usize },

    #[error("Invalid field: {0}")]
    Field(#[from] TypesError),
}

/// Encode `msg`; the block must hold exactly `tx_count` transactions.
pub fn encode(msg: &BlockMessage, tx_count: usize) -> Result<Vec<u8>, CodecError> {
    let block = &msg.block;
    if block.transactions.len() != tx_count {
        return Err(CodecError::WrongTransactionCount {
            expected: tx_count,
            found: block.transactions.len(),
        });
    }

    let mut w = ByteWriter::with_capacity(frame_size(tx_count));
    w.put_u32(msg.miner_id);
    w.put_fixed_str(&msg.hash, HASH_HEX_LEN);
    w.put_fixed_str(&block.id, BLOCK_ID_LEN);
    w.put_fixed_str(&block.previous_hash, HASH_HEX_LEN);
    w.put_u64(block.timestamp.as_millis());
    w.put_u64(block.nonce);
    for tx in &block.transactions {
        tx.write_bytes(&mut w);
    }
    Ok(w.into_inner())
}

/// Decode one complete frame of `tx_count` transactions.
pub fn decode(frame: &[u8], tx_count: usize) -> Result<BlockMessage, CodecError> {
    let expected = frame_size(tx_count);
    if frame.len() != expected {
        return Err(CodecError::WrongFrameLength {
            expected,
            found: frame.len(),
        });
    }

    let mut r = ByteReader::new(frame);
    let miner_id = r.get_u32()?;
    let hash = r.get_fixed_str(HASH_HEX_LEN, "frame.hash")?;
    let id = r.get_fixed_str(BLOCK_ID_LEN, "block.id")?;
    let previous_hash = r.get_fixed_str(HASH_HEX_LEN, "block.previous_hash")?;
    let timestamp = Timestamp::from_millis(r.get_u64()?);
    let nonce = r.get_u64()?;
    let transactions = (0..tx_count)
        .map(|_| Transaction::read_bytes(&mut r))
        .collect::<Result<Vec<_>, _>>()?;

    let mut block = Block::new(id, previous_hash, timestamp, transactions)?;
    block.nonce = nonce;
    Ok(BlockMessage {
        miner_id,
        hash,
        block,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::GENESIS_HASH;

    fn message(tx_count: usize) -> BlockMessage {
        let txs = (0..tx_count)
            .map(|i| {
                Transaction::new(
                    format!("tx-{i}"),
                    (i % 3) as u8 + 1,
                    i as u32,
                    i as u32 + 100,
                    i as f64 * 1.5,
                    Timestamp::from_millis(1_000 + i as u64),
                )
                .unwrap()
            })
            .collect();
        let mut block = Block::new("BLK-2-7", GENESIS_HASH, Timestamp::from_millis(42), txs).unwrap();
        block.nonce = 987_654;
        BlockMessage {
            miner_id: 2,
            hash: "0000a".to_string() + &"f".repeat(59),
            block,
        }
    }

    #[test]
    fn test_frame_size_formula() {
        assert_eq!(FRAME_HEADER_LEN, 180);
        assert_eq!(frame_size(3), 180 + 3 * 57);
    }

    #[test]
    fn test_encoded_frame_decodes_to_same_message() {
        let msg = message(3);
        let frame = encode(&msg, 3).unwrap();
        assert_eq!(frame.len(), frame_size(3));
        assert_eq!(decode(&frame, 3).unwrap(), msg);
    }

    #[test]
    fn test_encode_rejects_wrong_transaction_count() {
        assert_eq!(
            encode(&message(2), 3),
            Err(CodecError::WrongTransactionCount {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let frame = encode(&message(3), 3).unwrap();
        assert!(matches!(
            decode(&frame[..frame.len() - 1], 3),
            Err(CodecError::WrongFrameLength { .. })
        ));
    }

    #[test]
    fn test_corrupt_reward_is_rejected() {
        let mut frame = encode(&message(1), 1).unwrap();
        frame[FRAME_HEADER_LEN + shared_types::TX_ID_LEN] = 0;
        assert_eq!(
            decode(&frame, 1),
            Err(CodecError::Field(TypesError::InvalidReward(0)))
        );
    }
}
