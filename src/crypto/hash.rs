//! BLAKE3 hashing implementation
//!
//! All hashing in PetChain uses BLAKE3. Structured data is fed through
//! [`FieldHasher`], which tags and length-prefixes every field so that
//! two different field sequences can never produce the same byte stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create a zero hash (used as the genesis previous hash)
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Create hash from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Create hash from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Number of leading zero hex nibbles
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Hash arbitrary bytes using BLAKE3
pub fn hash_bytes(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    Hash(*hash.as_bytes())
}

/// Double hash (hash of hash), used for address checksums
pub fn double_hash(data: &[u8]) -> Hash {
    let first = hash_bytes(data);
    hash_bytes(&first.0)
}

const TAG_U64: u8 = 0x01;
const TAG_STR: u8 = 0x02;
const TAG_BYTES: u8 = 0x03;
const TAG_HASH: u8 = 0x04;
const TAG_U8: u8 = 0x05;

/// Incremental hasher over an ordered sequence of typed fields.
///
/// Every field is written as `tag || payload`; variable-length payloads
/// carry a little-endian u64 length prefix.
pub struct FieldHasher {
    inner: blake3::Hasher,
}

impl FieldHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(&[TAG_U64]);
        self.inner.update(&value.to_le_bytes());
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.inner.update(&[TAG_U8, value]);
        self
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.inner.update(&[TAG_STR]);
        self.inner.update(&(value.len() as u64).to_le_bytes());
        self.inner.update(value.as_bytes());
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.inner.update(&[TAG_BYTES]);
        self.inner.update(&(value.len() as u64).to_le_bytes());
        self.inner.update(value);
        self
    }

    pub fn hash(&mut self, value: &Hash) -> &mut Self {
        self.inner.update(&[TAG_HASH]);
        self.inner.update(&value.0);
        self
    }

    /// Feed a nested structure
    pub fn field<T: HashFields + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.hash_fields(self);
        self
    }

    pub fn finish(&self) -> Hash {
        Hash(*self.inner.finalize().as_bytes())
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Types that can contribute their fields to a [`FieldHasher`]
pub trait HashFields {
    fn hash_fields(&self, hasher: &mut FieldHasher);
}
