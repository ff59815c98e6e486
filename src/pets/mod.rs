//! Pets module - attribute oracle and the pet asset record

mod attributes;
mod pet;

pub use attributes::*;
pub use pet::*;
