//! Genesis block generation for PetChain
//!
//! The genesis block is fully determined by the difficulty: fixed
//! timestamp, fixed placeholder transaction, zero previous hash, and the
//! first nonce that satisfies the difficulty.

use crate::consensus::{Block, BlockTemplate};
use crate::constants::{GENESIS_MEMO, GENESIS_TIMESTAMP};
use crate::crypto::Hash;
use crate::mining::{Miner, MiningError};
use crate::validation::Transaction;

/// Unsealed genesis template
pub fn genesis_template() -> BlockTemplate {
    BlockTemplate::new(
        0,
        Hash::zero(),
        GENESIS_TIMESTAMP,
        Transaction::Genesis {
            memo: GENESIS_MEMO.to_string(),
        },
    )
}

/// Create the genesis block
///
/// Produces a byte-for-byte identical block for the same difficulty.
pub fn create_genesis_block(miner: &Miner) -> Result<Block, MiningError> {
    miner.mine(genesis_template())
}
