use crate::errors::{MigrateError, MigrateResult};
use crate::migration::{Migration, SourceProvider, StaticSource};
use std::collections::HashMap;

/// A source whose files live in memory, keyed by file name.
///
/// Keys are handed to `StaticSource` in sorted order, so which stem wins a
/// name clash does not depend on hash iteration order.
#[derive(Clone)]
pub struct MapSource {
    inner: StaticSource,
}

impl MapSource {
    pub fn new(files: HashMap<String, String>) -> MapSource {
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();

        let inner = StaticSource::new(names, move |name: &str| match files.get(name) {
            Some(body) => Ok(body.as_bytes().to_vec()),
            None => Err(MigrateError::not_exist()),
        });
        MapSource { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        MapSource::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl SourceProvider for MapSource {
    fn get(&self, id: u32) -> MigrateResult<Migration> {
        self.inner.get(id)
    }

    fn first(&self) -> MigrateResult<Migration> {
        self.inner.first()
    }

    fn next(&self, id: u32) -> MigrateResult<Option<u32>> {
        self.inner.next(id)
    }

    fn prev(&self, id: u32) -> MigrateResult<Option<u32>> {
        self.inner.prev(id)
    }
}
