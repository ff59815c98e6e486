//! Consensus module - Block structure, difficulty predicate, and validation

mod block;
mod validation;
mod difficulty;

pub use block::*;
pub use validation::*;
pub use difficulty::*;
