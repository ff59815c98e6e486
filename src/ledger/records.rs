//! Response shapes exposed to clients

use serde::Serialize;
use crate::consensus::Block;
use crate::validation::Transaction;

/// A pet transaction as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub pet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_owner: Option<String>,
    pub block_index: u64,
    pub block_hash: String,
    pub block_timestamp: u64,
}

impl TransactionRecord {
    /// Render a block's transaction; genesis has no record
    pub fn from_block(block: &Block) -> Option<Self> {
        let base = |pet_id: &str| TransactionRecord {
            kind: block.transaction.kind().to_string(),
            pet_id: pet_id.to_string(),
            owner_address: None,
            pet_name: None,
            from_owner: None,
            to_owner: None,
            block_index: block.index,
            block_hash: block.hash.to_hex(),
            block_timestamp: block.timestamp,
        };

        match &block.transaction {
            Transaction::Genesis { .. } => None,
            Transaction::CreateAsset {
                asset_id, owner, name, ..
            } => Some(TransactionRecord {
                owner_address: Some(owner.clone()),
                pet_name: Some(name.clone()),
                ..base(asset_id.as_str())
            }),
            Transaction::TradeAsset { asset_id, from, to } => Some(TransactionRecord {
                from_owner: Some(from.clone()),
                to_owner: Some(to.clone()),
                ..base(asset_id.as_str())
            }),
        }
    }

    pub fn is_create(&self) -> bool {
        self.kind == "CREATE_PET"
    }

    pub fn is_trade(&self) -> bool {
        self.kind == "TRADE_PET"
    }
}

/// Ledger statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    #[serde(rename = "totalPets")]
    pub total_pets: usize,
    #[serde(rename = "totalOwners")]
    pub total_owners: usize,
    #[serde(rename = "totalTransactions")]
    pub total_transactions: u64,
    #[serde(rename = "blockchainSize")]
    pub chain_length: u64,
    pub difficulty: u32,
    #[serde(rename = "blockchainValid")]
    pub chain_valid: bool,
}

/// A block as listed by `GET /api/blockchain`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: u64,
    pub nonce: u64,
    pub hash: String,
    pub transaction: Transaction,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            previous_hash: block.prev_hash.to_hex(),
            timestamp: block.timestamp,
            nonce: block.nonce,
            hash: block.hash.to_hex(),
            transaction: block.transaction.clone(),
        }
    }
}
