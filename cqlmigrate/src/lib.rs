//! # cqlmigrate - Schema migrations for Cassandra-style column stores
//!
//! cqlmigrate applies an ordered set of schema changes exactly once, from any
//! number of uncoordinated processes. Instead of an external lock service it
//! relies on the store's lightweight transactions: every migration id owns a
//! row of a tracking table, and only the process whose conditional insert is
//! applied runs the migration.
//!
//! ## Key Features
//!
//! - **Lock-free coordination**: mutual exclusion through `IF NOT EXISTS` /
//!   `IF dirty = ?` conditional writes
//! - **Crash detection**: an interrupted migration leaves a dirty row and
//!   blocks further runs until resolved
//! - **Pluggable catalogs**: migrations from a directory, a map, or any
//!   `SourceProvider`
//! - **Pluggable sessions**: the engine only needs `SessionProvider`; an
//!   in-memory session and a logging middleware are included
//!
//! ## Quick Start
//!
//! ```rust
//! use cqlmigrate::migration::{CasMigrator, MapSource, Migrator, MigratorConfig, Source};
//! use cqlmigrate::session::memory::InMemorySession;
//! use cqlmigrate::session::Session;
//!
//! # fn main() -> cqlmigrate::errors::MigrateResult<()> {
//! let source: MapSource = [
//!     ("1_init.up.cql", "CREATE TABLE users (id uuid PRIMARY KEY, name text)"),
//!     ("2_email.up.cql", "ALTER TABLE users ADD email text"),
//!     ("2_email.down.cql", "ALTER TABLE users DROP email"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let config = MigratorConfig::builder().table("schema_migrations").build()?;
//! let migrator = CasMigrator::new(Session::new(InMemorySession::new()), Source::new(source), config);
//!
//! migrator.up()?;
//! assert_eq!(migrator.current()?, Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`errors`]: `MigrateError` and its kinds
//! - [`common`]: column values, rows, clocks and statement templates
//! - [`session`]: the session contract, statements and bundled sessions
//! - [`migration`]: sources and migrators

pub mod common;
pub mod errors;
pub mod migration;
pub mod session;
