//! Pet asset record

use serde::{Deserialize, Serialize};
use crate::crypto::FieldHasher;
use super::PetAttributes;

const PET_ID_DOMAIN: &str = "petchain/pet-id";

/// Length of a pet id in hex characters
pub const PET_ID_LEN: usize = 16;

/// A minted pet. Everything except `owner` is fixed at mint time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: PetAttributes,
    pub owner: String,
    /// Index of the block that minted this pet
    #[serde(rename = "mintBlock")]
    pub mint_block: u64,
}

impl Pet {
    pub fn rarity(&self) -> u8 {
        self.attributes.rarity
    }
}

/// Derive the stable id for the `sequence`-th mint
pub fn derive_pet_id(owner: &str, name: &str, sequence: u64) -> String {
    let digest = FieldHasher::new()
        .str(PET_ID_DOMAIN)
        .str(owner)
        .str(name)
        .u64(sequence)
        .finish();
    digest.to_hex()[..PET_ID_LEN].to_string()
}
