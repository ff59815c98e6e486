//! HTTP API module
//!
//! REST interface consumed by the pet registry front end.

mod methods;
mod server;

pub use methods::*;
pub use server::*;
