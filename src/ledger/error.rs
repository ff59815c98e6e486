//! Ledger error taxonomy

use thiserror::Error;
use crate::consensus::ValidationError;
use crate::mining::MiningError;
use crate::storage::{IndexError, StoreError};

/// Errors returned by [`LedgerService`](super::LedgerService) operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("pet {0} does not exist")]
    AssetNotFound(String),
    #[error("pet {asset_id} is not owned by {claimed}")]
    NotOwner { asset_id: String, claimed: String },
    #[error("chain integrity violation: {0}")]
    ChainIntegrityViolation(String),
    #[error("mining exhausted {max_nonce} nonces at difficulty {difficulty}")]
    MiningExhausted { max_nonce: u64, difficulty: u32 },
    #[error("mining was cancelled")]
    MiningCancelled,
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Whether the caller is at fault (4xx) rather than the server (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidInput(_) | LedgerError::AssetNotFound(_) | LedgerError::NotOwner { .. }
        )
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::ChainIntegrityViolation(err.to_string())
    }
}

impl From<IndexError> for LedgerError {
    fn from(err: IndexError) -> Self {
        LedgerError::ChainIntegrityViolation(err.to_string())
    }
}

impl From<MiningError> for LedgerError {
    fn from(err: MiningError) -> Self {
        match err {
            MiningError::Exhausted { max_nonce, difficulty } => {
                LedgerError::MiningExhausted { max_nonce, difficulty }
            }
            MiningError::Interrupted => LedgerError::MiningCancelled,
        }
    }
}
