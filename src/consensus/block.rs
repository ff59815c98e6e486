//! Block structure for PetChain
//!
//! A block seals exactly one transaction with a proof-of-work nonce.

use serde::{Deserialize, Serialize};
use crate::crypto::{FieldHasher, Hash};
use crate::validation::Transaction;

/// Compute the hash of a block's fields
pub fn block_hash(
    index: u64,
    prev_hash: &Hash,
    timestamp: u64,
    transaction: &Transaction,
    nonce: u64,
) -> Hash {
    FieldHasher::new()
        .u64(index)
        .hash(prev_hash)
        .u64(timestamp)
        .field(transaction)
        .u64(nonce)
        .finish()
}

/// An unsealed block: everything except the nonce and hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub prev_hash: Hash,
    /// Milliseconds since Unix epoch
    pub timestamp: u64,
    pub transaction: Transaction,
}

impl BlockTemplate {
    pub fn new(index: u64, prev_hash: Hash, timestamp: u64, transaction: Transaction) -> Self {
        Self {
            index,
            prev_hash,
            timestamp,
            transaction,
        }
    }

    /// Hash this template would have with the given nonce
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        block_hash(self.index, &self.prev_hash, self.timestamp, &self.transaction, nonce)
    }

    /// Seal the template with a nonce, computing the final hash
    pub fn seal(self, nonce: u64) -> Block {
        let hash = self.hash_with_nonce(nonce);
        Block {
            index: self.index,
            prev_hash: self.prev_hash,
            timestamp: self.timestamp,
            transaction: self.transaction,
            nonce,
            hash,
        }
    }
}

/// A sealed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Hash of the previous block
    pub prev_hash: Hash,
    /// Milliseconds since Unix epoch
    pub timestamp: u64,
    pub transaction: Transaction,
    /// Nonce found by mining
    pub nonce: u64,
    /// Stored hash; must equal [`Block::compute_hash`]
    pub hash: Hash,
}

impl Block {
    /// Recompute the hash from the stored fields
    pub fn compute_hash(&self) -> Hash {
        block_hash(self.index, &self.prev_hash, self.timestamp, &self.transaction, self.nonce)
    }

    /// Whether the stored hash matches the fields
    pub fn is_sealed_correctly(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.prev_hash == Hash::zero()
    }
}
