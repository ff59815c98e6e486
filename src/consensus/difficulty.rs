//! Difficulty predicate
//!
//! A hash satisfies difficulty `d` when its hex form starts with `d` zero
//! nibbles, i.e. the hash read as a big-endian integer is below
//! `2^(256 - 4d)`. Difficulty is fixed for the life of the process.

use crate::crypto::Hash;

/// Largest difficulty expressible over a 32-byte hash
pub const MAX_DIFFICULTY: u32 = 64;

/// Check a hash against the difficulty predicate
pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
    hash.leading_zero_nibbles() >= difficulty
}

/// Exclusive 256-bit target for a difficulty, big-endian
///
/// The hash must compare strictly below the returned value. Difficulty 0
/// has no representable bound and yields all `0xFF`, which is accepted via
/// [`below_target`] treating it as inclusive.
pub fn difficulty_to_target(difficulty: u32) -> [u8; 32] {
    let mut target = [0u8; 32];
    if difficulty == 0 {
        return [0xFF; 32];
    }
    if difficulty > MAX_DIFFICULTY {
        return target;
    }

    // 2^(256 - 4d): a single set bit
    let bit = 256 - 4 * difficulty as usize;
    let byte_index = 31 - bit / 8;
    target[byte_index] = 1 << (bit % 8);
    target
}

/// Compare hash to target (hash < target)
pub fn below_target(hash: &Hash, target: &[u8; 32]) -> bool {
    if *target == [0xFF; 32] {
        return true;
    }
    for i in 0..32 {
        if hash.0[i] < target[i] {
            return true;
        }
        if hash.0[i] > target[i] {
            return false;
        }
    }
    false // Equal
}
