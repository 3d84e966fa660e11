use crate::errors::MigrateResult;
use crate::migration::Migration;
use std::ops::Deref;
use std::sync::Arc;

/// An ordered catalog of migrations.
///
/// # Purpose
/// Lets a migrator walk the available migrations in ascending id order without
/// knowing where they come from (a static list, a map, a directory).
///
/// # Guarantees expected from implementations
/// - Ids are unique and strictly increasing in iteration order
/// - `first`, `next`, `prev` and `get` are deterministic and agree with that order
/// - The catalog does not change after construction
///
/// # Errors
/// - `get` of an unknown id and `first` of an empty catalog fail with `NotExist`
/// - `next` and `prev` fail with `NotExist` when the given id is unknown, and
///   return `None` at either end of the catalog
pub trait SourceProvider: Send + Sync {
    fn get(&self, id: u32) -> MigrateResult<Migration>;

    fn first(&self) -> MigrateResult<Migration>;

    fn next(&self, id: u32) -> MigrateResult<Option<u32>>;

    fn prev(&self, id: u32) -> MigrateResult<Option<u32>>;
}

/// Cheap-to-clone handle over a `SourceProvider`.
#[derive(Clone)]
pub struct Source {
    inner: Arc<dyn SourceProvider>,
}

impl Source {
    pub fn new<T: SourceProvider + 'static>(inner: T) -> Self {
        Source {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Source {
    type Target = Arc<dyn SourceProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
