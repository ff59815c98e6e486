//! Database persistence layer using Sled
//!
//! Blocks are stored by big-endian index so iteration yields chain order.
//! Wallets and the difficulty the chain was mined at live beside them.

use sled::{Db, Tree};
use std::path::Path;
use thiserror::Error;
use crate::consensus::Block;

const DIFFICULTY_KEY: &str = "difficulty";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Database wrapper
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    blocks_tree: Tree,
    wallets_tree: Tree,
    metadata_tree: Tree,
}

impl LedgerDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_db(sled::open(path)?)
    }

    /// Open a throwaway database removed on drop
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        let blocks_tree = db.open_tree("blocks")?;
        let wallets_tree = db.open_tree("wallets")?;
        let metadata_tree = db.open_tree("metadata")?;

        Ok(Self {
            db,
            blocks_tree,
            wallets_tree,
            metadata_tree,
        })
    }

    /// Save a block
    pub fn save_block(&self, block: &Block) -> Result<(), StoreError> {
        let value = bincode::serialize(block)?;
        self.blocks_tree.insert(block.index.to_be_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    /// Load every stored block in index order
    pub fn load_blocks(&self) -> Result<Vec<Block>, StoreError> {
        let mut blocks = Vec::with_capacity(self.blocks_tree.len());
        for item in self.blocks_tree.iter() {
            let (_, value) = item?;
            blocks.push(bincode::deserialize(&value)?);
        }
        Ok(blocks)
    }

    /// Record a wallet address and its creation time
    pub fn save_wallet(&self, address: &str, created_at: u64) -> Result<(), StoreError> {
        self.wallets_tree
            .insert(address.as_bytes(), created_at.to_le_bytes().as_ref())?;
        self.db.flush()?;
        Ok(())
    }

    /// Load all wallets as (address, created_at)
    pub fn load_wallets(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut wallets = Vec::with_capacity(self.wallets_tree.len());
        for item in self.wallets_tree.iter() {
            let (key, value) = item?;
            let address = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::Corrupt(format!("wallet address: {}", e)))?;
            let bytes = <[u8; 8]>::try_from(&value[..])
                .map_err(|_| StoreError::Corrupt(format!("wallet {} timestamp", address)))?;
            wallets.push((address, u64::from_le_bytes(bytes)));
        }
        Ok(wallets)
    }

    /// Difficulty the stored chain was mined at
    pub fn load_difficulty(&self) -> Result<Option<u32>, StoreError> {
        match self.metadata_tree.get(DIFFICULTY_KEY)? {
            Some(bytes) => {
                let raw = <[u8; 4]>::try_from(&bytes[..])
                    .map_err(|_| StoreError::Corrupt("difficulty".to_string()))?;
                Ok(Some(u32::from_le_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    pub fn save_difficulty(&self, difficulty: u32) -> Result<(), StoreError> {
        self.metadata_tree
            .insert(DIFFICULTY_KEY, difficulty.to_le_bytes().as_ref())?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::Miner;
    use crate::node::create_genesis_block;

    #[test]
    fn test_block_roundtrip_in_order() {
        let db = LedgerDb::temporary().unwrap();
        let genesis = create_genesis_block(&Miner::new(1)).unwrap();
        db.save_block(&genesis).unwrap();

        let loaded = db.load_blocks().unwrap();
        assert_eq!(loaded, vec![genesis]);
    }

    #[test]
    fn test_big_endian_keys_sort_by_index() {
        let db = LedgerDb::temporary().unwrap();
        let genesis = create_genesis_block(&Miner::new(1)).unwrap();
        let mut later = genesis.clone();
        later.index = 256;
        let mut middle = genesis.clone();
        middle.index = 2;

        db.save_block(&later).unwrap();
        db.save_block(&genesis).unwrap();
        db.save_block(&middle).unwrap();

        let indexes: Vec<u64> = db.load_blocks().unwrap().iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 2, 256]);
    }

    #[test]
    fn test_wallets_and_difficulty() {
        let db = LedgerDb::temporary().unwrap();
        assert_eq!(db.load_difficulty().unwrap(), None);

        db.save_wallet("PETalice", 42).unwrap();
        db.save_difficulty(3).unwrap();

        assert_eq!(db.load_wallets().unwrap(), vec![("PETalice".to_string(), 42)]);
        assert_eq!(db.load_difficulty().unwrap(), Some(3));
    }
}
