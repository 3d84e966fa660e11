//! Session layer consumed by the migration engine.
//!
//! The engine talks to the database through the `SessionProvider` trait,
//! wrapped in a cheap-to-clone `Session` handle. Implementations decide how
//! statements reach the cluster; this crate ships:
//! - **`InMemorySession`**: tracking tables kept in memory with linearizable
//!   conditional writes, for tests and embedded use
//! - **`LoggingSession`**: middleware logging every statement it forwards
//!
//! # Conditional writes
//!
//! Mutual exclusion between migrators relies entirely on lightweight
//! transactions. `exec_cas` reports whether the condition held through a
//! `ConditionalResult`, and `ensure_applied` turns a rejected write into a
//! `ConcurrentMigration` error.
mod cas;
mod cursor;
mod logging;
pub mod memory;
mod session;
mod statement;

pub use cas::*;
pub use cursor::*;
pub use logging::*;
pub use session::*;
pub use statement::*;
