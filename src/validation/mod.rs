//! Validation module - transaction types carried by blocks

mod transaction;

pub use transaction::*;
