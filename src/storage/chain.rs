//! Append-only block chain
//!
//! Holds the ordered, hash-linked blocks and enforces the linkage and
//! proof-of-work rules on every append.

use crate::consensus::{validate_chain, validate_genesis, validate_successor, Block, ValidationError};
use crate::crypto::Hash;

/// Ordered sequence of blocks, index 0 (genesis) to N-1
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: u32,
}

impl Chain {
    /// Start a chain from a genesis block
    pub fn new(genesis: Block, difficulty: u32) -> Result<Self, ValidationError> {
        validate_genesis(&genesis, difficulty)?;
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
        })
    }

    /// Rebuild a chain from stored blocks, validating all of them
    pub fn from_blocks(blocks: Vec<Block>, difficulty: u32) -> Result<Self, ValidationError> {
        validate_chain(&blocks, difficulty)?;
        Ok(Self { blocks, difficulty })
    }

    /// Check that `block` would be accepted as the next block
    pub fn check_next(&self, block: &Block) -> Result<(), ValidationError> {
        validate_successor(self.tip(), block, self.difficulty)
    }

    /// Append a mined block. On error the chain is unchanged.
    pub fn append(&mut self, block: Block) -> Result<(), ValidationError> {
        self.check_next(&block)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Full validation of every block
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_chain(&self.blocks, self.difficulty)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn at(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Latest block. A chain always holds at least genesis.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn tip_hash(&self) -> Hash {
        self.tip().hash
    }

    pub fn len(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::BlockTemplate;
    use crate::mining::Miner;
    use crate::node::create_genesis_block;
    use crate::validation::Transaction;

    const DIFFICULTY: u32 = 1;

    fn trade(index: u64, prev_hash: Hash) -> Block {
        let template = BlockTemplate::new(
            index,
            prev_hash,
            1_700_000_000_000,
            Transaction::TradeAsset {
                asset_id: "a1".to_string(),
                from: "PETalice".to_string(),
                to: "PETbob".to_string(),
            },
        );
        Miner::new(DIFFICULTY).mine(template).unwrap()
    }

    fn chain() -> Chain {
        Chain::new(create_genesis_block(&Miner::new(DIFFICULTY)).unwrap(), DIFFICULTY).unwrap()
    }

    #[test]
    fn test_new_chain_has_genesis() {
        let chain = chain();
        assert_eq!(chain.len(), 1);
        assert!(chain.tip().is_genesis());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_extends_tip() {
        let mut chain = chain();
        let block = trade(1, chain.tip_hash());
        chain.append(block.clone()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tip(), &block);
        assert_eq!(chain.at(1), Some(&block));
        assert!(chain.is_valid());
    }

    #[test]
    fn test_append_rejects_stale_parent() {
        let mut chain = chain();
        let genesis_hash = chain.tip_hash();
        chain.append(trade(1, genesis_hash)).unwrap();

        let stale = trade(2, genesis_hash);
        assert_eq!(chain.append(stale), Err(ValidationError::BrokenLink { index: 2 }));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_append_rejects_wrong_index() {
        let mut chain = chain();
        let block = trade(5, chain.tip_hash());
        assert_eq!(
            chain.append(block),
            Err(ValidationError::IndexGap { expected: 1, found: 5 })
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_append_rejects_forged_hash() {
        let mut chain = chain();
        let mut block = trade(1, chain.tip_hash());
        block.hash = Hash::zero();
        assert_eq!(chain.append(block), Err(ValidationError::HashMismatch { index: 1 }));
    }

    #[test]
    fn test_from_blocks_revalidates() {
        let mut chain = chain();
        chain.append(trade(1, chain.tip_hash())).unwrap();

        let mut blocks = chain.blocks().to_vec();
        assert!(Chain::from_blocks(blocks.clone(), DIFFICULTY).is_ok());

        blocks[1].timestamp += 1;
        assert!(Chain::from_blocks(blocks, DIFFICULTY).is_err());
    }

    #[test]
    fn test_iteration_order() {
        let mut chain = chain();
        chain.append(trade(1, chain.tip_hash())).unwrap();
        chain.append(trade(2, chain.tip_hash())).unwrap();
        let indexes: Vec<u64> = chain.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }
}
