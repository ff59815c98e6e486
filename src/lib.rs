//! PetChain Core Library
//!
//! A single-node proof-of-work ledger for digital collectible pets.
//! Every mint and trade is mined into its own block; owner and history
//! views are derived from the chain and rebuilt by replay.

pub mod consensus;
pub mod crypto;
pub mod validation;
pub mod storage;
pub mod mining;
pub mod wallet;
pub mod node;
pub mod pets;
pub mod ledger;
pub mod rpc;
pub mod config;
pub mod logging;

/// Protocol constants
pub mod constants {
    /// Chain name (short form for addresses/logos)
    pub const CHAIN_NAME: &str = "PET";

    /// Full chain name
    pub const CHAIN_FULL_NAME: &str = "PetChain";

    /// Genesis timestamp (ms since Unix epoch, 2025-01-01T00:00:00Z)
    pub const GENESIS_TIMESTAMP: u64 = 1_735_689_600_000;

    /// Placeholder carried by the genesis transaction
    pub const GENESIS_MEMO: &str = "PetChain genesis";

    /// Longest accepted pet name, in characters
    pub const MAX_PET_NAME_LEN: usize = 64;

    /// Difficulty used when none is configured (leading zero hex digits)
    pub const DEFAULT_DIFFICULTY: u32 = 4;
}
