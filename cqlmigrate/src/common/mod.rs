//! Shared building blocks: CQL values and rows, clocks and statement constants.

mod clock;
mod constants;
mod value;

pub use clock::*;
pub use constants::*;
pub use value::*;
