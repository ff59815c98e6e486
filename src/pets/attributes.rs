//! Attribute oracle
//!
//! Pet attributes are a pure function of the mint seed: the same owner,
//! name and mint sequence always yield the same type, color and rarity.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::crypto::{FieldHasher, Hash, HashFields};

const ATTRIBUTE_DOMAIN: &str = "petchain/attributes";

/// Rarity weights in per-mille, index 0 is rarity 1 (Common)
pub const RARITY_WEIGHTS: [u32; 5] = [500, 250, 150, 70, 30];

/// Pet species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetType {
    Dragon,
    Cat,
    Dog,
    Bird,
    Fish,
    Tiger,
    Lion,
    Wolf,
    Eagle,
    Shark,
    Fox,
    Bear,
    Rabbit,
    Turtle,
    Snake,
}

impl PetType {
    pub const ALL: [PetType; 15] = [
        PetType::Dragon,
        PetType::Cat,
        PetType::Dog,
        PetType::Bird,
        PetType::Fish,
        PetType::Tiger,
        PetType::Lion,
        PetType::Wolf,
        PetType::Eagle,
        PetType::Shark,
        PetType::Fox,
        PetType::Bear,
        PetType::Rabbit,
        PetType::Turtle,
        PetType::Snake,
    ];
}

impl fmt::Display for PetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pet color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Black,
    White,
    Gold,
    Silver,
    Brown,
    Gray,
    Cyan,
    Magenta,
}

impl PetColor {
    pub const ALL: [PetColor; 15] = [
        PetColor::Red,
        PetColor::Blue,
        PetColor::Green,
        PetColor::Yellow,
        PetColor::Purple,
        PetColor::Orange,
        PetColor::Pink,
        PetColor::Black,
        PetColor::White,
        PetColor::Gold,
        PetColor::Silver,
        PetColor::Brown,
        PetColor::Gray,
        PetColor::Cyan,
        PetColor::Magenta,
    ];
}

impl fmt::Display for PetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Attributes fixed at mint time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetAttributes {
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub color: PetColor,
    /// 1 (Common) ..= 5 (Legendary)
    pub rarity: u8,
}

impl HashFields for PetAttributes {
    fn hash_fields(&self, hasher: &mut FieldHasher) {
        hasher
            .u8(self.pet_type as u8)
            .u8(self.color as u8)
            .u8(self.rarity);
    }
}

/// Seed material for a mint: owner, name and zero-based mint sequence
pub fn attribute_seed(owner: &str, name: &str, sequence: u64) -> Hash {
    FieldHasher::new()
        .str(ATTRIBUTE_DOMAIN)
        .str(owner)
        .str(name)
        .u64(sequence)
        .finish()
}

/// Derive attributes from a seed digest.
///
/// Bytes 0..8 pick the type, 8..16 the color, and 16..20 are bucketed
/// through [`RARITY_WEIGHTS`].
pub fn derive_attributes(seed: &Hash) -> PetAttributes {
    let bytes = seed.as_bytes();

    let type_word = u64::from_le_bytes(word(bytes, 0));
    let color_word = u64::from_le_bytes(word(bytes, 8));
    let rarity_word = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);

    PetAttributes {
        pet_type: PetType::ALL[(type_word % PetType::ALL.len() as u64) as usize],
        color: PetColor::ALL[(color_word % PetColor::ALL.len() as u64) as usize],
        rarity: rarity_bucket(rarity_word % 1000),
    }
}

fn word(bytes: &[u8; 32], start: usize) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[start..start + 8]);
    out
}

/// Map a per-mille roll onto a rarity tier
fn rarity_bucket(roll: u32) -> u8 {
    let mut cumulative = 0;
    for (tier, weight) in RARITY_WEIGHTS.iter().enumerate() {
        cumulative += weight;
        if roll < cumulative {
            return tier as u8 + 1;
        }
    }
    RARITY_WEIGHTS.len() as u8
}
