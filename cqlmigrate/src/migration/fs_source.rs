use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::migration::{Migration, SourceProvider, StaticSource};
use std::fs;
use std::path::{Path, PathBuf};

/// A source reading migration files from one directory.
///
/// Only the regular files directly inside the directory are considered;
/// subdirectories are not visited. The listing happens once in `new`, while
/// file contents are read from disk each time a migration half is opened.
#[derive(Clone)]
pub struct FsSource {
    dir: PathBuf,
    inner: StaticSource,
}

impl FsSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> MigrateResult<FsSource> {
        let dir = dir.as_ref().to_path_buf();
        let names = list_files(&dir).map_err(|err| {
            MigrateError::new_with_cause(
                &format!("Can't list migration directory {}", dir.display()),
                ErrorKind::IOError,
                err,
            )
        })?;

        let root = dir.clone();
        let inner = StaticSource::new(names, move |name: &str| {
            Ok(fs::read(root.join(name))?)
        });

        log::debug!(
            "Found {} migrations in {}",
            inner.len(),
            dir.display()
        );
        Ok(FsSource { dir, inner })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn list_files(dir: &Path) -> MigrateResult<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("Can't process {:?} as a migration file", name),
        }
    }

    names.sort();
    Ok(names)
}

impl SourceProvider for FsSource {
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
