//! In-memory session backend.
mod parser;
mod session;
mod table;

pub use session::*;
