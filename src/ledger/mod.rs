//! Ledger service - the pet registry on top of the chain

mod error;
mod records;
mod service;

pub use error::*;
pub use records::*;
pub use service::*;
