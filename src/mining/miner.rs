//! Block miner implementation
//!
//! Searches for a nonce that makes a block template satisfy the
//! difficulty predicate. Mining never touches chain state; it only
//! returns a sealed candidate.

use crate::consensus::{below_target, difficulty_to_target, Block, BlockTemplate, MAX_DIFFICULTY};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// How often the progress trace is emitted
const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Mining errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    #[error("nonce space exhausted at {max_nonce} without meeting difficulty {difficulty}")]
    Exhausted { max_nonce: u64, difficulty: u32 },
    #[error("mining interrupted by stop signal")]
    Interrupted,
}

/// Block miner
#[derive(Debug, Clone)]
pub struct Miner {
    difficulty: u32,
    /// Big-endian bound every accepted hash falls below
    target: [u8; 32],
    /// Highest nonce tried before giving up
    max_nonce: u64,
    /// Stop signal
    stop_signal: Arc<AtomicBool>,
}

impl Miner {
    /// Create a miner searching the full u64 nonce space
    pub fn new(difficulty: u32) -> Self {
        Self::with_max_nonce(difficulty, u64::MAX)
    }

    pub fn with_max_nonce(difficulty: u32, max_nonce: u64) -> Self {
        let difficulty = difficulty.min(MAX_DIFFICULTY);
        Self {
            difficulty,
            target: difficulty_to_target(difficulty),
            max_nonce,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Stop mining
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Reset stop signal
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }

    /// Mine a block (find valid nonce)
    ///
    /// Tries nonces from 0 upward, checking the stop signal before each
    /// attempt, until the hash meets the difficulty or `max_nonce` has
    /// been tried.
    pub fn mine(&self, template: BlockTemplate) -> Result<Block, MiningError> {
        let started = Instant::now();
        let mut nonce = 0u64;

        loop {
            if self.stop_signal.load(Ordering::SeqCst) {
                return Err(MiningError::Interrupted);
            }

            let hash = template.hash_with_nonce(nonce);
            if below_target(&hash, &self.target) {
                debug!(
                    index = template.index,
                    nonce,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "block mined"
                );
                return Ok(template.seal(nonce));
            }

            if nonce >= self.max_nonce {
                return Err(MiningError::Exhausted {
                    max_nonce: self.max_nonce,
                    difficulty: self.difficulty,
                });
            }

            nonce += 1;
            if nonce % PROGRESS_INTERVAL == 0 {
                debug!(index = template.index, nonce, "mining in progress");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::meets_difficulty;
    use crate::crypto::Hash;
    use crate::validation::Transaction;

    fn template() -> BlockTemplate {
        BlockTemplate::new(1, Hash::zero(), 1_700_000_000_000, Transaction::Genesis { memo: "m".to_string() })
    }

    #[test]
    fn test_mined_block_meets_difficulty() {
        let block = Miner::new(2).mine(template()).unwrap();
        assert!(block.is_sealed_correctly());
        assert!(block.hash.to_hex().starts_with("00"));
    }

    #[test]
    fn test_mining_is_deterministic() {
        let a = Miner::new(2).mine(template()).unwrap();
        let b = Miner::new(2).mine(template()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_valid_nonce_is_found() {
        let block = Miner::new(1).mine(template()).unwrap();
        let t = template();
        for nonce in 0..block.nonce {
            assert!(!meets_difficulty(&t.hash_with_nonce(nonce), 1));
        }
    }

    #[test]
    fn test_exhausted_nonce_space() {
        let miner = Miner::with_max_nonce(16, 10);
        assert_eq!(
            miner.mine(template()),
            Err(MiningError::Exhausted { max_nonce: 10, difficulty: 16 })
        );
    }

    #[test]
    fn test_miner_stop_signal() {
        let miner = Miner::new(1);
        miner.stop();
        assert_eq!(miner.mine(template()), Err(MiningError::Interrupted));

        // Clones share the signal
        let handle = miner.clone();
        miner.reset();
        assert!(handle.mine(template()).is_ok());
        handle.stop();
        assert_eq!(miner.mine(template()), Err(MiningError::Interrupted));
    }

    #[test]
    fn test_top_difficulty_accepts_only_zero_hash() {
        let miner = Miner::with_max_nonce(MAX_DIFFICULTY, 32);
        assert_eq!(
            miner.mine(template()),
            Err(MiningError::Exhausted { max_nonce: 32, difficulty: MAX_DIFFICULTY })
        );
    }
}
