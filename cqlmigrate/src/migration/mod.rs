//! Migration catalog and migrators.
//!
//! A `Source` lists the available migrations in ascending id order; a
//! `Migrator` applies or rolls them back against a `Session`.
//!
//! # Sources
//!
//! - **`StaticSource`**: a list of file names plus a fetcher loading their content
//! - **`MapSource`**: file names and contents held in a map
//! - **`FsSource`**: the files of one directory
//! - **`SingleMigrationSource`**: one migration with id 1, for test harnesses
//!
//! File names follow `<id>_<name>.<up|down>.cql`, e.g. `3_final.up.cql`.
//!
//! # Migrators
//!
//! `CasMigrator` tracks applied migrations in a table and relies on
//! lightweight transactions so concurrent processes never apply the same
//! migration twice. `MultiMigrator` drives several migrators at once.
//!
//! ```rust
//! use cqlmigrate::migration::{CasMigrator, MapSource, Migrator, MigratorConfig, Source};
//! use cqlmigrate::session::memory::InMemorySession;
//! use cqlmigrate::session::Session;
//!
//! let source: MapSource = [
//!     ("1_users.up.cql", "CREATE TABLE users (id uuid PRIMARY KEY)"),
//!     ("1_users.down.cql", "DROP TABLE users"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let migrator = CasMigrator::new(
//!     Session::new(InMemorySession::new()),
//!     Source::new(source),
//!     MigratorConfig::default(),
//! );
//!
//! migrator.up().unwrap();
//! assert_eq!(migrator.current().unwrap(), Some(1));
//! migrator.down().unwrap();
//! assert_eq!(migrator.current().unwrap(), None);
//! ```
mod config;
mod fs_source;
mod map_source;
mod migration;
mod migrator;
mod multi;
mod single_source;
mod source;
mod static_source;

pub use config::*;
pub use fs_source::*;
pub use map_source::*;
pub(crate) use migration::read_body;
pub use migration::{Fetcher, Migration};
pub use migrator::*;
pub use multi::*;
pub use single_source::*;
pub use source::*;
pub use static_source::StaticSource;
