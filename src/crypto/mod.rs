//! Cryptography module - BLAKE3 hashing of structured fields

mod hash;

pub use hash::*;
