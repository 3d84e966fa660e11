use crate::errors::{MigrateError, MigrateResult};
use std::fmt::{Debug, Formatter};
use std::io::{Cursor, Read};
use std::sync::Arc;

/// Loads the content of a migration file by name.
pub type Fetcher = Arc<dyn Fn(&str) -> MigrateResult<Vec<u8>> + Send + Sync>;

/// A single schema change, identified by its id.
///
/// # Purpose
/// Holds references to the up and down bodies of a migration. Bodies are not
/// loaded until `up()` or `down()` is called, and either half may be absent.
///
/// # Characteristics
/// - Immutable after construction
/// - Cheap to clone: the fetcher is shared
/// - Opening an absent half fails with `NotExist`
#[derive(Clone)]
pub struct Migration {
    id: u32,
    name: String,
    up: Option<String>,
    down: Option<String>,
    fetcher: Fetcher,
}

impl Migration {
    /// Creates a migration whose halves are loaded through `fetcher` using the
    /// `up` and `down` file names.
    pub fn new(
        id: u32,
        name: &str,
        up: Option<String>,
        down: Option<String>,
        fetcher: Fetcher,
    ) -> Self {
        Migration {
            id,
            name: name.to_string(),
            up,
            down,
            fetcher,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The file stem shared by both halves, e.g. `3_final`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_up(&self) -> bool {
        self.up.is_some()
    }

    pub fn has_down(&self) -> bool {
        self.down.is_some()
    }

    /// Opens the up body.
    pub fn up(&self) -> MigrateResult<Box<dyn Read + Send>> {
        self.open(self.up.as_deref())
    }

    /// Opens the down body.
    pub fn down(&self) -> MigrateResult<Box<dyn Read + Send>> {
        self.open(self.down.as_deref())
    }

    fn open(&self, file: Option<&str>) -> MigrateResult<Box<dyn Read + Send>> {
        match file {
            Some(file) => {
                let content = (self.fetcher)(file)?;
                Ok(Box::new(Cursor::new(content)))
            }
            None => Err(MigrateError::not_exist()),
        }
    }

    pub(crate) fn set_up(&mut self, file: &str) {
        self.up = Some(file.to_string());
    }

    pub(crate) fn set_down(&mut self, file: &str) {
        self.down = Some(file.to_string());
    }
}

impl Debug for Migration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("up", &self.up)
            .field("down", &self.down)
            .finish()
    }
}

/// Reads a migration body to the end as UTF-8 text.
pub(crate) fn read_body(mut reader: Box<dyn Read + Send>) -> MigrateResult<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
