//! Storage module - chain, derived indexes, and on-disk persistence

mod chain;
mod index;
pub mod db;

pub use chain::*;
pub use index::*;
pub use db::{LedgerDb, StoreError};
