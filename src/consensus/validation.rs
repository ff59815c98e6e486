//! Block and chain validation
//!
//! Pure functions for validating blocks and chains.

use crate::consensus::{meets_difficulty, Block};
use crate::crypto::Hash;
use crate::node::genesis_template;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain is empty")]
    Empty,
    #[error("block {index}: stored hash does not match its fields")]
    HashMismatch { index: u64 },
    #[error("block {index}: hash does not satisfy difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: u32 },
    #[error("block {index}: previous hash does not link to the prior block")]
    BrokenLink { index: u64 },
    #[error("expected block index {expected}, found {found}")]
    IndexGap { expected: u64, found: u64 },
    #[error("invalid genesis block: {0}")]
    BadGenesis(&'static str),
}

/// Validate a block's own seal: hash consistency and proof of work
pub fn validate_seal(block: &Block, difficulty: u32) -> Result<(), ValidationError> {
    if !block.is_sealed_correctly() {
        return Err(ValidationError::HashMismatch { index: block.index });
    }
    if !meets_difficulty(&block.hash, difficulty) {
        return Err(ValidationError::InsufficientWork {
            index: block.index,
            difficulty,
        });
    }
    Ok(())
}

/// Validate a block against the block it extends
pub fn validate_successor(prev: &Block, block: &Block, difficulty: u32) -> Result<(), ValidationError> {
    let expected = prev.index + 1;
    if block.index != expected {
        return Err(ValidationError::IndexGap {
            expected,
            found: block.index,
        });
    }
    if block.prev_hash != prev.hash {
        return Err(ValidationError::BrokenLink { index: block.index });
    }
    if block.transaction.is_genesis() {
        return Err(ValidationError::BadGenesis("genesis transaction past block 0"));
    }
    validate_seal(block, difficulty)
}

/// Validate the genesis block
pub fn validate_genesis(block: &Block, difficulty: u32) -> Result<(), ValidationError> {
    if block.index != 0 {
        return Err(ValidationError::IndexGap {
            expected: 0,
            found: block.index,
        });
    }
    if block.prev_hash != Hash::zero() {
        return Err(ValidationError::BadGenesis("previous hash is not the zero sentinel"));
    }
    if !block.transaction.is_genesis() {
        return Err(ValidationError::BadGenesis("first block does not carry the genesis transaction"));
    }
    let expected = genesis_template();
    if block.timestamp != expected.timestamp {
        return Err(ValidationError::BadGenesis("timestamp is not the fixed genesis timestamp"));
    }
    if block.transaction != expected.transaction {
        return Err(ValidationError::BadGenesis("genesis memo does not match"));
    }
    validate_seal(block, difficulty)
}

/// Validate a full chain, oldest block first.
///
/// Recomputes every hash, checks index monotonicity and linkage, and checks
/// the difficulty predicate for every block including genesis.
pub fn validate_chain(blocks: &[Block], difficulty: u32) -> Result<(), ValidationError> {
    let genesis = blocks.first().ok_or(ValidationError::Empty)?;
    validate_genesis(genesis, difficulty)?;

    for pair in blocks.windows(2) {
        validate_successor(&pair[0], &pair[1], difficulty)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::BlockTemplate;
    use crate::mining::Miner;
    use crate::node::create_genesis_block;
    use crate::validation::Transaction;

    const DIFFICULTY: u32 = 1;

    fn mined(index: u64, prev_hash: Hash, transaction: Transaction) -> Block {
        let template = BlockTemplate::new(index, prev_hash, 1_700_000_000_000 + index, transaction);
        Miner::new(DIFFICULTY).mine(template).expect("mining at difficulty 1")
    }

    fn chain() -> Vec<Block> {
        let genesis = create_genesis_block(&Miner::new(DIFFICULTY)).expect("genesis");
        let trade = mined(
            1,
            genesis.hash,
            Transaction::TradeAsset {
                asset_id: "a1".to_string(),
                from: "PETalice".to_string(),
                to: "PETbob".to_string(),
            },
        );
        vec![genesis, trade]
    }

    #[test]
    fn test_valid_chain() {
        assert_eq!(validate_chain(&chain(), DIFFICULTY), Ok(()));
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(validate_chain(&[], DIFFICULTY), Err(ValidationError::Empty));
    }

    #[test]
    fn test_broken_link() {
        let mut blocks = chain();
        let genesis_hash = blocks[0].hash;
        let mut tampered = blocks[1].clone();
        tampered.prev_hash = Hash([9u8; 32]);
        // reseal so only the link is wrong
        let reseal = BlockTemplate::new(tampered.index, tampered.prev_hash, tampered.timestamp, tampered.transaction);
        blocks[1] = Miner::new(DIFFICULTY).mine(reseal).unwrap();
        assert_ne!(blocks[1].prev_hash, genesis_hash);
        assert_eq!(
            validate_chain(&blocks, DIFFICULTY),
            Err(ValidationError::BrokenLink { index: 1 })
        );
    }

    #[test]
    fn test_tampered_nonce() {
        let mut blocks = chain();
        blocks[1].nonce = blocks[1].nonce.wrapping_add(1);
        assert_eq!(
            validate_chain(&blocks, DIFFICULTY),
            Err(ValidationError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn test_index_gap() {
        let blocks = chain();
        let skipped = mined(
            2,
            blocks[0].hash,
            Transaction::TradeAsset {
                asset_id: "a1".to_string(),
                from: "PETbob".to_string(),
                to: "PETalice".to_string(),
            },
        );
        assert_eq!(
            validate_successor(&blocks[0], &skipped, DIFFICULTY),
            Err(ValidationError::IndexGap { expected: 1, found: 2 })
        );
    }

    #[test]
    fn test_foreign_genesis_rejected() {
        let template = genesis_template();
        let other_memo = Miner::new(DIFFICULTY)
            .mine(BlockTemplate::new(
                0,
                Hash::zero(),
                template.timestamp,
                Transaction::Genesis { memo: "another chain".to_string() },
            ))
            .unwrap();
        assert!(other_memo.is_sealed_correctly());
        assert!(matches!(
            validate_genesis(&other_memo, DIFFICULTY),
            Err(ValidationError::BadGenesis(_))
        ));

        let other_time = Miner::new(DIFFICULTY)
            .mine(BlockTemplate::new(0, Hash::zero(), template.timestamp + 1, template.transaction))
            .unwrap();
        assert!(matches!(
            validate_genesis(&other_time, DIFFICULTY),
            Err(ValidationError::BadGenesis(_))
        ));
    }

    #[test]
    fn test_genesis_must_be_first() {
        let blocks = chain();
        assert!(matches!(
            validate_genesis(&blocks[1], DIFFICULTY),
            Err(ValidationError::IndexGap { .. })
        ));
    }

    #[test]
    fn test_unmined_block_rejected() {
        // find a nonce whose hash does NOT meet difficulty 1
        let template = BlockTemplate::new(0, Hash::zero(), 0, Transaction::Genesis { memo: "g".to_string() });
        let nonce = (0u64..)
            .find(|n| !meets_difficulty(&template.hash_with_nonce(*n), DIFFICULTY))
            .unwrap();
        let block = template.seal(nonce);
        assert_eq!(
            validate_seal(&block, DIFFICULTY),
            Err(ValidationError::InsufficientWork { index: 0, difficulty: DIFFICULTY })
        );
    }
}
