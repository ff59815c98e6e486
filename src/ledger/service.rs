//! Ledger service
//!
//! Owns the chain, the derived indexes and the wallet registry. Every
//! mutation goes through a single writer: validate, build a transaction,
//! mine, then persist and apply under the state write lock. Readers take
//! the read lock and never see a half-applied block.

use parking_lot::{Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use super::error::LedgerError;
use super::records::{LedgerStats, TransactionRecord};
use crate::config::LedgerConfig;
use crate::constants::MAX_PET_NAME_LEN;
use crate::consensus::{Block, BlockTemplate, MAX_DIFFICULTY};
use crate::mining::Miner;
use crate::node::create_genesis_block;
use crate::pets::{attribute_seed, derive_attributes, derive_pet_id, Pet};
use crate::storage::{Chain, LedgerDb, LedgerIndex};
use crate::validation::Transaction;
use crate::wallet::{decode_address, WalletRegistry};

/// Everything guarded by the state lock
#[derive(Debug)]
struct LedgerState {
    chain: Chain,
    index: LedgerIndex,
    wallets: WalletRegistry,
}

/// The pet ledger
pub struct LedgerService {
    state: RwLock<LedgerState>,
    /// Serialises mutating requests
    writer: Mutex<()>,
    miner: Miner,
    store: Option<LedgerDb>,
}

impl LedgerService {
    /// Start a fresh, non-persistent ledger
    pub fn in_memory(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let miner = miner_for(config)?;
        let genesis = create_genesis_block(&miner)?;
        info!(difficulty = config.difficulty, hash = %genesis.hash, "genesis block created");

        let chain = Chain::new(genesis, config.difficulty)?;
        let index = LedgerIndex::replay(&chain)?;
        Ok(Self::with_state(
            LedgerState {
                chain,
                index,
                wallets: WalletRegistry::new(),
            },
            miner,
            None,
        ))
    }

    /// Open a persistent ledger, replaying any stored chain
    ///
    /// A store written at a different difficulty is refused.
    pub fn open(config: &LedgerConfig, store: LedgerDb) -> Result<Self, LedgerError> {
        let miner = miner_for(config)?;

        if let Some(stored) = store.load_difficulty()? {
            if stored != config.difficulty {
                return Err(LedgerError::ChainIntegrityViolation(format!(
                    "stored chain was mined at difficulty {}, configured difficulty is {}",
                    stored, config.difficulty
                )));
            }
        }

        let blocks = store.load_blocks()?;
        let chain = if blocks.is_empty() {
            let genesis = create_genesis_block(&miner)?;
            let chain = Chain::new(genesis, config.difficulty)?;
            store.save_difficulty(config.difficulty)?;
            store.save_block(chain.tip())?;
            info!(difficulty = config.difficulty, hash = %chain.tip_hash(), "genesis block created");
            chain
        } else {
            let chain = Chain::from_blocks(blocks, config.difficulty).map_err(|err| {
                error!(%err, "stored chain failed validation");
                err
            })?;
            store.save_difficulty(config.difficulty)?;
            chain
        };

        let index = LedgerIndex::replay(&chain)?;
        let wallets = WalletRegistry::from_entries(
            store.load_wallets()?.into_iter().map(|(address, _created_at)| address),
        );
        info!(
            blocks = chain.len(),
            pets = index.pet_count(),
            wallets = wallets.len(),
            "ledger replayed from storage"
        );

        Ok(Self::with_state(
            LedgerState {
                chain,
                index,
                wallets,
            },
            miner,
            Some(store),
        ))
    }

    fn with_state(state: LedgerState, miner: Miner, store: Option<LedgerDb>) -> Self {
        Self {
            state: RwLock::new(state),
            writer: Mutex::new(()),
            miner,
            store,
        }
    }

    /// Issue a new wallet address
    pub fn create_wallet(&self) -> Result<String, LedgerError> {
        let _writer = self.writer.lock();
        let mut state = self.state.write();
        let address = state.wallets.fresh_address();

        if let Some(store) = &self.store {
            store.save_wallet(&address, now_ms())?;
        }
        if !state.wallets.register(address.clone()) {
            return Err(integrity(format!("wallet {} was issued twice", address)));
        }

        info!(%address, "wallet created");
        Ok(address)
    }

    /// Mint a pet for `owner`
    pub fn create_asset(&self, owner: &str, name: &str) -> Result<Pet, LedgerError> {
        let owner = address(owner, "ownerAddress")?;
        let name = required(name, "petName")?;
        if name.chars().count() > MAX_PET_NAME_LEN {
            return Err(reject(LedgerError::InvalidInput(format!(
                "petName must be at most {} characters",
                MAX_PET_NAME_LEN
            ))));
        }

        let _writer = self.writer.lock();
        let block = self.commit(|state| {
            if !state.wallets.contains(owner) {
                return Err(LedgerError::InvalidInput(format!("unknown wallet {}", owner)));
            }
            let sequence = state.index.mint_count();
            Ok(Transaction::CreateAsset {
                asset_id: derive_pet_id(owner, name, sequence),
                owner: owner.to_string(),
                name: name.to_string(),
                sequence,
                attributes: derive_attributes(&attribute_seed(owner, name, sequence)),
            })
        })?;

        self.committed_pet(&block)
    }

    /// Move a pet from `from` to `to`
    ///
    /// Trading to the current owner is accepted and recorded; ownership
    /// does not change.
    pub fn trade_asset(&self, asset_id: &str, from: &str, to: &str) -> Result<Pet, LedgerError> {
        let asset_id = required(asset_id, "petId")?;
        let from = address(from, "fromOwner")?;
        let to = address(to, "toOwner")?;

        let _writer = self.writer.lock();
        let block = self.commit(|state| {
            let pet = state
                .index
                .pet(asset_id)
                .ok_or_else(|| LedgerError::AssetNotFound(asset_id.to_string()))?;
            if pet.owner != from {
                return Err(LedgerError::NotOwner {
                    asset_id: asset_id.to_string(),
                    claimed: from.to_string(),
                });
            }
            if !state.wallets.contains(to) {
                return Err(LedgerError::InvalidInput(format!("unknown wallet {}", to)));
            }
            Ok(Transaction::TradeAsset {
                asset_id: asset_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            })
        })?;

        self.committed_pet(&block)
    }

    /// Mine and append one block. Caller holds the writer lock.
    ///
    /// The writer lock keeps the tip fixed while mining runs outside the
    /// state lock; `check_next` still refuses a block whose parent moved.
    fn commit<F>(&self, build: F) -> Result<Block, LedgerError>
    where
        F: FnOnce(&LedgerState) -> Result<Transaction, LedgerError>,
    {
        self.miner.reset();

        let template = {
            let state = self.state.read();
            let transaction = build(&*state).map_err(reject)?;
            let tip = state.chain.tip();
            BlockTemplate::new(tip.index + 1, tip.hash, now_ms().max(tip.timestamp), transaction)
        };

        // Mining runs without the state lock so reads stay available
        let block = self.miner.mine(template).map_err(|err| {
            error!(%err, "mining failed");
            LedgerError::from(err)
        })?;

        let mut state = self.state.write();
        state.chain.check_next(&block).map_err(integrity)?;
        state.index.check(&block.transaction).map_err(integrity)?;
        if let Some(store) = &self.store {
            store.save_block(&block)?;
        }
        state.chain.append(block.clone()).map_err(integrity)?;
        state.index.apply(&block).map_err(integrity)?;

        info!(
            index = block.index,
            hash = %block.hash,
            kind = block.transaction.kind(),
            "block appended"
        );
        Ok(block)
    }

    /// The pet touched by a just-committed block
    fn committed_pet(&self, block: &Block) -> Result<Pet, LedgerError> {
        let asset_id = block
            .transaction
            .asset_id()
            .ok_or_else(|| integrity("committed block carries no pet"))?;
        self.state
            .read()
            .index
            .pet(asset_id)
            .cloned()
            .ok_or_else(|| integrity(format!("committed pet {} missing from index", asset_id)))
    }

    /// Interrupt an in-flight mining attempt
    pub fn cancel_mining(&self) {
        self.miner.stop();
    }

    pub fn wallet_exists(&self, address: &str) -> bool {
        self.state.read().wallets.contains(address.trim())
    }

    /// Pets currently held by `owner`; empty for unknown owners
    pub fn assets_by_owner(&self, owner: &str) -> Vec<Pet> {
        self.state.read().index.pets_by_owner(owner.trim())
    }

    pub fn asset(&self, asset_id: &str) -> Result<Pet, LedgerError> {
        let asset_id = asset_id.trim();
        self.state
            .read()
            .index
            .pet(asset_id)
            .cloned()
            .ok_or_else(|| LedgerError::AssetNotFound(asset_id.to_string()))
    }

    pub fn all_assets(&self) -> Vec<Pet> {
        self.state.read().index.all_pets()
    }

    /// Transactions touching a pet, mint first
    pub fn asset_history(&self, asset_id: &str) -> Result<Vec<TransactionRecord>, LedgerError> {
        let asset_id = asset_id.trim();
        let state = self.state.read();
        let history = state
            .index
            .pet_history(asset_id)
            .ok_or_else(|| LedgerError::AssetNotFound(asset_id.to_string()))?;
        Ok(records(&state.chain, history))
    }

    /// Transactions an address created, sent or received, in chain order
    pub fn owner_history(&self, address: &str) -> Vec<TransactionRecord> {
        let state = self.state.read();
        records(&state.chain, state.index.owner_history(address.trim()))
    }

    /// Counters plus a fresh full-chain validation
    pub fn stats(&self) -> LedgerStats {
        let state = self.state.read();
        LedgerStats {
            total_pets: state.index.pet_count(),
            total_owners: state.index.owner_count(),
            total_transactions: state.index.transaction_count(),
            chain_length: state.chain.len(),
            difficulty: state.chain.difficulty(),
            chain_valid: state.chain.is_valid(),
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.state.read().chain.blocks().to_vec()
    }

    pub fn block(&self, index: u64) -> Option<Block> {
        self.state.read().chain.at(index).cloned()
    }

    pub fn validate_chain(&self) -> bool {
        let state = self.state.read();
        match state.chain.validate() {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "chain validation failed");
                false
            }
        }
    }

    pub fn chain_length(&self) -> u64 {
        self.state.read().chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.miner.difficulty()
    }
}

fn miner_for(config: &LedgerConfig) -> Result<Miner, LedgerError> {
    if config.difficulty == 0 || config.difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::InvalidInput(format!(
            "difficulty must be in 1..={}, got {}",
            MAX_DIFFICULTY, config.difficulty
        )));
    }
    Ok(Miner::with_max_nonce(config.difficulty, config.max_nonce))
}

fn records(chain: &Chain, indexes: &[u64]) -> Vec<TransactionRecord> {
    indexes
        .iter()
        .filter_map(|&i| chain.at(i))
        .filter_map(TransactionRecord::from_block)
        .collect()
}

/// Trimmed, non-empty input field
fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(reject(LedgerError::InvalidInput(format!("{} is required", field))));
    }
    Ok(value)
}

/// Trimmed input that parses as a wallet address
fn address<'a>(value: &'a str, field: &str) -> Result<&'a str, LedgerError> {
    let value = required(value, field)?;
    decode_address(value).map_err(|err| {
        reject(LedgerError::InvalidInput(format!("{} is not a valid address: {}", field, err)))
    })?;
    Ok(value)
}

fn reject(err: LedgerError) -> LedgerError {
    if err.is_client_error() {
        warn!(%err, "request rejected");
    }
    err
}

fn integrity<E: ToString>(err: E) -> LedgerError {
    let err = LedgerError::ChainIntegrityViolation(err.to_string());
    error!(%err, "integrity fault");
    err
}

/// Milliseconds since the Unix epoch
fn now_ms() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as u64,
        Err(err) => {
            debug!(%err, "system clock before epoch");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LedgerService {
        LedgerService::in_memory(&LedgerConfig::with_difficulty(1)).unwrap()
    }

    #[test]
    fn test_starts_with_genesis() {
        let ledger = service();
        assert_eq!(ledger.chain_length(), 1);
        assert!(ledger.validate_chain());
        assert!(ledger.owner_history("anyone").is_empty());
    }

    #[test]
    fn test_wallets_are_distinct_and_registered() {
        let ledger = service();
        let mut issued = std::collections::HashSet::new();
        for _ in 0..200 {
            let address = ledger.create_wallet().unwrap();
            assert!(ledger.wallet_exists(&address));
            assert!(issued.insert(address));
        }
        assert_eq!(ledger.state.read().wallets.len(), 200);
    }

    #[test]
    fn test_mint_requires_registered_wallet() {
        let ledger = service();
        let err = ledger.create_asset("PETnobody", "Rex").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert_eq!(ledger.chain_length(), 1);
    }

    #[test]
    fn test_mint_trims_inputs() {
        let ledger = service();
        let owner = ledger.create_wallet().unwrap();
        let pet = ledger.create_asset(&format!("  {} ", owner), "  Rex ").unwrap();
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.owner, owner);
        assert_eq!(pet.mint_block, 1);
    }

    #[test]
    fn test_name_length_limit() {
        let ledger = service();
        let owner = ledger.create_wallet().unwrap();
        let long = "x".repeat(MAX_PET_NAME_LEN + 1);
        assert!(matches!(
            ledger.create_asset(&owner, &long),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(ledger.create_asset(&owner, &"x".repeat(MAX_PET_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_exhausted_mining_leaves_state() {
        let miner = Miner::new(1);
        let genesis = create_genesis_block(&miner).unwrap();
        // A ledger whose miner can never succeed
        let ledger = LedgerService::with_state(
            LedgerState {
                chain: Chain::new(genesis, 1).unwrap(),
                index: LedgerIndex::new(),
                wallets: WalletRegistry::new(),
            },
            Miner::with_max_nonce(64, 4),
            None,
        );
        let owner = ledger.create_wallet().unwrap();
        let err = ledger.create_asset(&owner, "Rex").unwrap_err();
        assert!(matches!(err, LedgerError::MiningExhausted { max_nonce: 4, .. }));
        assert_eq!(ledger.chain_length(), 1);
        assert!(ledger.all_assets().is_empty());
    }
}
