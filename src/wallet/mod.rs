//! Wallet module - address issuance and the wallet registry
//!
//! Addresses are opaque to the ledger; the format only guards against
//! typos. Ownership is never proven cryptographically.

mod registry;

pub use registry::*;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Address prefix
pub const ADDRESS_PREFIX: &str = crate::constants::CHAIN_NAME;

/// Random bytes behind an address
const ADDRESS_BODY_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;

/// Address decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid address prefix")]
    InvalidPrefix,
    #[error("invalid base58 encoding")]
    InvalidEncoding,
    #[error("invalid address length")]
    InvalidLength,
    #[error("invalid checksum")]
    InvalidChecksum,
}

/// Encode address body bytes
/// Address format: "PET" + Base58(body[0:20] + checksum[0:4])
pub fn encode_address(body: &[u8; ADDRESS_BODY_LEN]) -> String {
    let checksum = crate::crypto::double_hash(body);
    let mut payload = Vec::with_capacity(ADDRESS_BODY_LEN + CHECKSUM_LEN);
    payload.extend_from_slice(body);
    payload.extend_from_slice(&checksum.0[..CHECKSUM_LEN]);
    format!("{}{}", ADDRESS_PREFIX, bs58::encode(payload).into_string())
}

/// Draw a fresh address from the OS RNG
pub fn generate_address() -> String {
    let mut body = [0u8; ADDRESS_BODY_LEN];
    OsRng.fill_bytes(&mut body);
    encode_address(&body)
}

/// Decode an address back to its body bytes, verifying the checksum
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_BODY_LEN], AddressError> {
    let encoded = address
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or(AddressError::InvalidPrefix)?;
    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| AddressError::InvalidEncoding)?;

    if decoded.len() != ADDRESS_BODY_LEN + CHECKSUM_LEN {
        return Err(AddressError::InvalidLength);
    }

    let (body, checksum) = decoded.split_at(ADDRESS_BODY_LEN);
    let expected = crate::crypto::double_hash(body);
    if checksum != &expected.0[..CHECKSUM_LEN] {
        return Err(AddressError::InvalidChecksum);
    }

    let mut out = [0u8; ADDRESS_BODY_LEN];
    out.copy_from_slice(body);
    Ok(out)
}
