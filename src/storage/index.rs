//! Derived ledger indexes
//!
//! Owner and history views rebuilt from the chain. The chain is the
//! source of truth; everything here can be dropped and replayed.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use crate::consensus::Block;
use crate::pets::{attribute_seed, derive_attributes, derive_pet_id, Pet};
use crate::validation::Transaction;

/// Errors raised when a block does not fit the indexed state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("pet {0} is already registered")]
    DuplicatePet(String),
    #[error("pet {0} is not registered")]
    UnknownPet(String),
    #[error("pet {asset_id} is owned by {owner}, not {claimed}")]
    OwnerMismatch {
        asset_id: String,
        owner: String,
        claimed: String,
    },
    #[error("mint sequence {found} out of order, expected {expected}")]
    SequenceMismatch { expected: u64, found: u64 },
    #[error("pet {0} does not match the attributes derived from its seed")]
    AttributeMismatch(String),
}

/// Owner, pet and history indexes
#[derive(Debug, Clone, Default)]
pub struct LedgerIndex {
    pets: HashMap<String, Pet>,
    /// owner -> pet ids currently held
    owners: HashMap<String, BTreeSet<String>>,
    /// pet id -> block indexes, mint first
    pet_history: HashMap<String, Vec<u64>>,
    /// address -> block indexes it appears in
    owner_history: HashMap<String, Vec<u64>>,
    mint_count: u64,
    transaction_count: u64,
}

impl LedgerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild indexes by replaying blocks in order
    pub fn replay<'a, I>(blocks: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let mut index = Self::new();
        for block in blocks {
            index.apply(block)?;
        }
        Ok(index)
    }

    /// Check that a transaction fits the current state without applying it
    pub fn check(&self, transaction: &Transaction) -> Result<(), IndexError> {
        match transaction {
            Transaction::Genesis { .. } => Ok(()),
            Transaction::CreateAsset {
                asset_id,
                owner,
                name,
                sequence,
                attributes,
            } => {
                if *sequence != self.mint_count {
                    return Err(IndexError::SequenceMismatch {
                        expected: self.mint_count,
                        found: *sequence,
                    });
                }
                if self.pets.contains_key(asset_id) {
                    return Err(IndexError::DuplicatePet(asset_id.clone()));
                }
                let derived = derive_attributes(&attribute_seed(owner, name, *sequence));
                if derived != *attributes || derive_pet_id(owner, name, *sequence) != *asset_id {
                    return Err(IndexError::AttributeMismatch(asset_id.clone()));
                }
                Ok(())
            }
            Transaction::TradeAsset { asset_id, from, .. } => {
                let pet = self
                    .pets
                    .get(asset_id)
                    .ok_or_else(|| IndexError::UnknownPet(asset_id.clone()))?;
                if pet.owner != *from {
                    return Err(IndexError::OwnerMismatch {
                        asset_id: asset_id.clone(),
                        owner: pet.owner.clone(),
                        claimed: from.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Apply a block's transaction. On error the index is unchanged.
    pub fn apply(&mut self, block: &Block) -> Result<(), IndexError> {
        self.check(&block.transaction)?;

        match &block.transaction {
            Transaction::Genesis { .. } => return Ok(()),
            Transaction::CreateAsset {
                asset_id,
                owner,
                name,
                attributes,
                ..
            } => {
                self.pets.insert(
                    asset_id.clone(),
                    Pet {
                        id: asset_id.clone(),
                        name: name.clone(),
                        attributes: *attributes,
                        owner: owner.clone(),
                        mint_block: block.index,
                    },
                );
                self.owners
                    .entry(owner.clone())
                    .or_default()
                    .insert(asset_id.clone());
                self.owner_history
                    .entry(owner.clone())
                    .or_default()
                    .push(block.index);
                self.mint_count += 1;
            }
            Transaction::TradeAsset { asset_id, from, to } => {
                if let Some(pet) = self.pets.get_mut(asset_id) {
                    pet.owner = to.clone();
                }
                if let Some(held) = self.owners.get_mut(from) {
                    held.remove(asset_id);
                    if held.is_empty() {
                        self.owners.remove(from);
                    }
                }
                self.owners
                    .entry(to.clone())
                    .or_default()
                    .insert(asset_id.clone());

                self.owner_history
                    .entry(from.clone())
                    .or_default()
                    .push(block.index);
                if to != from {
                    self.owner_history
                        .entry(to.clone())
                        .or_default()
                        .push(block.index);
                }
            }
        }

        if let Some(asset_id) = block.transaction.asset_id() {
            self.pet_history
                .entry(asset_id.to_string())
                .or_default()
                .push(block.index);
        }
        self.transaction_count += 1;
        Ok(())
    }

    pub fn pet(&self, asset_id: &str) -> Option<&Pet> {
        self.pets.get(asset_id)
    }

    /// Pets held by `owner`, in mint order
    pub fn pets_by_owner(&self, owner: &str) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self
            .owners
            .get(owner)
            .into_iter()
            .flatten()
            .filter_map(|id| self.pets.get(id).cloned())
            .collect();
        pets.sort_by_key(|p| p.mint_block);
        pets
    }

    /// Every pet, in mint order
    pub fn all_pets(&self) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self.pets.values().cloned().collect();
        pets.sort_by_key(|p| p.mint_block);
        pets
    }

    /// Block indexes touching a pet, or `None` if never minted
    pub fn pet_history(&self, asset_id: &str) -> Option<&[u64]> {
        self.pet_history.get(asset_id).map(Vec::as_slice)
    }

    /// Block indexes an address appears in
    pub fn owner_history(&self, address: &str) -> &[u64] {
        self.owner_history
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Next mint sequence number
    pub fn mint_count(&self) -> u64 {
        self.mint_count
    }

    pub fn pet_count(&self) -> usize {
        self.pets.len()
    }

    /// Addresses currently holding at least one pet
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Non-genesis transactions applied
    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::BlockTemplate;
    use crate::crypto::Hash;

    fn block(index: u64, transaction: Transaction) -> Block {
        // seals are not checked by the index
        BlockTemplate::new(index, Hash::zero(), index, transaction).seal(0)
    }

    fn mint(index: u64, owner: &str, name: &str, sequence: u64) -> Block {
        block(
            index,
            Transaction::CreateAsset {
                asset_id: derive_pet_id(owner, name, sequence),
                owner: owner.to_string(),
                name: name.to_string(),
                sequence,
                attributes: derive_attributes(&attribute_seed(owner, name, sequence)),
            },
        )
    }

    fn trade(index: u64, asset_id: &str, from: &str, to: &str) -> Block {
        block(
            index,
            Transaction::TradeAsset {
                asset_id: asset_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            },
        )
    }

    #[test]
    fn test_mint_registers_pet() {
        let mut index = LedgerIndex::new();
        let minted = mint(1, "PETalice", "Rex", 0);
        index.apply(&minted).unwrap();

        let id = minted.transaction.asset_id().unwrap();
        assert_eq!(index.pet(id).unwrap().owner, "PETalice");
        assert_eq!(index.pets_by_owner("PETalice").len(), 1);
        assert_eq!(index.pet_history(id), Some(&[1u64][..]));
        assert_eq!(index.owner_history("PETalice"), &[1]);
        assert_eq!(index.mint_count(), 1);
        assert_eq!(index.owner_count(), 1);
    }

    #[test]
    fn test_trade_moves_pet() {
        let mut index = LedgerIndex::new();
        let minted = mint(1, "PETalice", "Rex", 0);
        let id = minted.transaction.asset_id().unwrap().to_string();
        index.apply(&minted).unwrap();
        index.apply(&trade(2, &id, "PETalice", "PETbob")).unwrap();

        assert!(index.pets_by_owner("PETalice").is_empty());
        assert_eq!(index.pets_by_owner("PETbob")[0].id, id);
        assert_eq!(index.owner_count(), 1);
        assert_eq!(index.pet_history(&id), Some(&[1u64, 2][..]));
        assert_eq!(index.owner_history("PETalice"), &[1, 2]);
        assert_eq!(index.owner_history("PETbob"), &[2]);
        assert_eq!(index.transaction_count(), 2);
    }

    #[test]
    fn test_self_trade_keeps_owner() {
        let mut index = LedgerIndex::new();
        let minted = mint(1, "PETalice", "Rex", 0);
        let id = minted.transaction.asset_id().unwrap().to_string();
        index.apply(&minted).unwrap();
        index.apply(&trade(2, &id, "PETalice", "PETalice")).unwrap();

        assert_eq!(index.pets_by_owner("PETalice").len(), 1);
        assert_eq!(index.owner_history("PETalice"), &[1, 2]);
        assert_eq!(index.pet_history(&id).map(<[u64]>::len), Some(2));
    }

    #[test]
    fn test_trade_from_wrong_owner_is_rejected_without_change() {
        let mut index = LedgerIndex::new();
        let minted = mint(1, "PETalice", "Rex", 0);
        let id = minted.transaction.asset_id().unwrap().to_string();
        index.apply(&minted).unwrap();

        let err = index.apply(&trade(2, &id, "PETbob", "PETcarol")).unwrap_err();
        assert!(matches!(err, IndexError::OwnerMismatch { .. }));
        assert_eq!(index.pets_by_owner("PETalice").len(), 1);
        assert!(index.owner_history("PETcarol").is_empty());
        assert_eq!(index.transaction_count(), 1);
    }

    #[test]
    fn test_unknown_pet_trade() {
        let index = LedgerIndex::new();
        let err = index
            .check(&trade(1, "missing", "PETalice", "PETbob").transaction)
            .unwrap_err();
        assert_eq!(err, IndexError::UnknownPet("missing".to_string()));
    }

    #[test]
    fn test_forged_attributes_rejected() {
        let mut forged = mint(1, "PETalice", "Rex", 0);
        if let Transaction::CreateAsset { attributes, .. } = &mut forged.transaction {
            attributes.rarity = if attributes.rarity == 5 { 1 } else { 5 };
        }
        let err = LedgerIndex::new().apply(&forged).unwrap_err();
        assert!(matches!(err, IndexError::AttributeMismatch(_)));
    }

    #[test]
    fn test_sequence_must_follow_mint_count() {
        let err = LedgerIndex::new().apply(&mint(1, "PETalice", "Rex", 3)).unwrap_err();
        assert_eq!(err, IndexError::SequenceMismatch { expected: 0, found: 3 });
    }

    #[test]
    fn test_replay_matches_incremental() {
        let first = mint(1, "PETalice", "Rex", 0);
        let id = first.transaction.asset_id().unwrap().to_string();
        let blocks = vec![
            block(0, Transaction::Genesis { memo: "g".to_string() }),
            first,
            mint(2, "PETbob", "Tom", 1),
            trade(3, &id, "PETalice", "PETbob"),
        ];

        let replayed = LedgerIndex::replay(&blocks).unwrap();
        assert_eq!(replayed.pet_count(), 2);
        assert_eq!(replayed.transaction_count(), 3);
        assert_eq!(replayed.pets_by_owner("PETbob").len(), 2);
        assert_eq!(replayed.owner_count(), 1);
    }
}
