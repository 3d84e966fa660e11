use crate::common::{
    MIGRATION_DOWN, MIGRATION_FILE_EXTENSION, MIGRATION_ID_SEPARATOR, MIGRATION_UP,
};
use crate::errors::{MigrateError, MigrateResult};
use crate::migration::{Fetcher, Migration, SourceProvider};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
}

/// Splits `<id>_<name>.<up|down>.cql` into its id, stem and direction.
pub(crate) fn parse_file_name(file: &str) -> Option<(u32, &str, Direction)> {
    let parts: Vec<&str> = file.split('.').collect();
    if parts.len() != 3 || parts[2] != MIGRATION_FILE_EXTENSION {
        return None;
    }

    let direction = match parts[1] {
        MIGRATION_UP => Direction::Up,
        MIGRATION_DOWN => Direction::Down,
        _ => return None,
    };

    let stem = parts[0];
    let id = stem
        .split(MIGRATION_ID_SEPARATOR)
        .next()?
        .parse::<u32>()
        .ok()?;

    Some((id, stem, direction))
}

/// A source built once from a flat list of file names.
///
/// Names that do not follow `<id>_<name>.<up|down>.cql` are skipped with a
/// warning. The up and down files of one id are merged when they share the same
/// stem; a second stem for an id already seen is skipped, so the first one in
/// input order wins. Bodies are loaded through the fetcher only when a
/// migration half is opened.
///
/// ```rust
/// use cqlmigrate::migration::{SourceProvider, StaticSource};
///
/// let source = StaticSource::new(
///     vec!["2_initial.up.cql", "3_final.up.cql", "3_final.down.cql"],
///     |name: &str| Ok(name.as_bytes().to_vec()),
/// );
///
/// assert_eq!(source.first().unwrap().id(), 2);
/// assert_eq!(source.next(2).unwrap(), Some(3));
/// assert_eq!(source.next(3).unwrap(), None);
/// ```
#[derive(Clone)]
pub struct StaticSource {
    migrations: BTreeMap<u32, Migration>,
}

impl StaticSource {
    pub fn new<I, S, F>(names: I, fetcher: F) -> StaticSource
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> MigrateResult<Vec<u8>> + Send + Sync + 'static,
    {
        let fetcher: Fetcher = Arc::new(fetcher);
        let mut migrations: BTreeMap<u32, Migration> = BTreeMap::new();

        for name in names {
            let file = name.as_ref();
            let (id, stem, direction) = match parse_file_name(file) {
                Some(parsed) => parsed,
                None => {
                    log::warn!("Can't process {:?} as a migration file", file);
                    continue;
                }
            };

            let migration = migrations
                .entry(id)
                .or_insert_with(|| Migration::new(id, stem, None, None, fetcher.clone()));

            if migration.name() != stem {
                log::warn!(
                    "Name mismatch between {:?} and {:?}, for migration {:?}, skipping it",
                    migration.name(),
                    stem,
                    file
                );
                continue;
            }

            match direction {
                Direction::Up => migration.set_up(file),
                Direction::Down => migration.set_down(file),
            }
        }

        log::debug!("Loaded {} migrations", migrations.len());
        StaticSource { migrations }
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.migrations.keys().copied().collect()
    }

    fn ensure_known(&self, id: u32) -> MigrateResult<()> {
        if self.migrations.contains_key(&id) {
            Ok(())
        } else {
            Err(MigrateError::not_exist())
        }
    }
}

impl SourceProvider for StaticSource {
    fn get(&self, id: u32) -> MigrateResult<Migration> {
        self.migrations
            .get(&id)
            .cloned()
            .ok_or_else(MigrateError::not_exist)
    }

    fn first(&self) -> MigrateResult<Migration> {
        self.migrations
            .values()
            .next()
            .cloned()
            .ok_or_else(MigrateError::not_exist)
    }

    fn next(&self, id: u32) -> MigrateResult<Option<u32>> {
        self.ensure_known(id)?;
        Ok(self
            .migrations
            .range((Excluded(id), Unbounded))
            .next()
            .map(|(next, _)| *next))
    }

    fn prev(&self, id: u32) -> MigrateResult<Option<u32>> {
        self.ensure_known(id)?;
        Ok(self.migrations.range(..id).next_back().map(|(prev, _)| *prev))
    }
}
