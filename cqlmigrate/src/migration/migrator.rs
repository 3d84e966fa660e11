use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::migration::{read_body, Migration, MigratorConfig, Source};
use crate::session::{ensure_applied, Session, Statement};

/// Applies and rolls back migrations against a store.
///
/// Implementations are safe to call concurrently from any number of threads or
/// processes sharing the same store.
pub trait Migrator: Send + Sync {
    /// Applies every pending migration in ascending id order.
    fn up(&self) -> MigrateResult<()>;

    /// Rolls back the most recently applied migration, if any.
    fn down(&self) -> MigrateResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Up,
    Down,
}

impl Half {
    fn label(&self) -> &'static str {
        match self {
            Half::Up => "UP",
            Half::Down => "DOWN",
        }
    }
}

/// Migrator keeping its state in a tracking table guarded by conditional writes.
///
/// # Purpose
/// Lets uncoordinated processes apply an ordered set of migrations exactly
/// once. Each migration id owns one row of the tracking table; the row is
/// claimed with `INSERT ... IF NOT EXISTS`, so among racing migrators only one
/// runs a given body, and the others fail with `ConcurrentMigration`.
///
/// # State
/// - no row: nothing applied
/// - highest row clean: that migration is the current one
/// - any dirty row: a previous run stopped between claim and commit (or between
///   mark and release); every call fails with `Dirty` until an operator fixes
///   the row
///
/// # Up
/// For each pending migration: read its up body, claim the row as dirty,
/// execute the body, then flip the row clean with `IF dirty = true`. The state
/// is read again before each step.
///
/// # Down
/// Rolls back exactly one migration per call: read the current migration's
/// down body, mark the row dirty with `IF dirty = false`, execute the body,
/// then delete the row with `IF EXISTS`.
///
/// Bodies are read completely before the first write, so a missing or
/// unreadable body leaves the tracking table untouched.
#[derive(Clone)]
pub struct CasMigrator {
    session: Session,
    source: Source,
    config: MigratorConfig,
}

impl CasMigrator {
    pub fn new(session: Session, source: Source, config: MigratorConfig) -> Self {
        CasMigrator {
            session,
            source,
            config,
        }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Id of the applied migration, `None` when nothing is applied.
    ///
    /// Creates the tracking table if needed but writes no row. Fails with
    /// `Dirty` like `up` and `down` do.
    pub fn current(&self) -> MigrateResult<Option<u32>> {
        self.ensure_table()?;
        self.read_state()
    }

    fn ensure_table(&self) -> MigrateResult<()> {
        self.session
            .exec(&self.config.create_table_stmt())
            .map_err(|err| {
                log::error!(
                    "Can't create migration table {}: {}",
                    self.config.table(),
                    err
                );
                MigrateError::new_with_cause(
                    &format!("Can't build migration table {}", self.config.table()),
                    ErrorKind::BackendError,
                    err,
                )
            })
    }

    /// Highest applied id, rejecting any dirty row.
    fn read_state(&self) -> MigrateResult<Option<u32>> {
        let mut cursor = self.session.query(&self.config.fetch_stmt());
        let mut current: Option<u32> = None;
        let mut dirty: Option<u32> = None;
        let mut failure: Option<MigrateError> = None;

        for row in cursor.by_ref() {
            let parsed = row
                .get::<i32>(0)
                .and_then(|num| Ok((tracked_id(num)?, row.get::<bool>(1)?)));

            match parsed {
                Ok((id, is_dirty)) => {
                    if is_dirty && dirty.is_none() {
                        dirty = Some(id);
                    }
                    current = current.max(Some(id));
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        cursor.close()?;
        if let Some(err) = failure {
            return Err(err);
        }

        if let Some(id) = dirty {
            log::error!(
                "Migration {} is dirty in {}, fix the tracking table before migrating",
                id,
                self.config.table()
            );
            return Err(MigrateError::dirty(id));
        }

        log::debug!(
            "Current migration in {}: {:?}",
            self.config.table(),
            current
        );
        Ok(current)
    }

    fn next_migration(&self, current: Option<u32>) -> MigrateResult<Option<Migration>> {
        match current {
            None => match self.source.first() {
                Ok(migration) => Ok(Some(migration)),
                Err(err) if err.kind() == &ErrorKind::NotExist => Ok(None),
                Err(err) => Err(err),
            },
            Some(id) => match self.source.next(id)? {
                Some(next) => Ok(Some(self.source.get(next)?)),
                None => Ok(None),
            },
        }
    }

    fn read_half(&self, migration: &Migration, half: Half) -> MigrateResult<String> {
        let (present, opened) = match half {
            Half::Up => (migration.has_up(), migration.up()),
            Half::Down => (migration.has_down(), migration.down()),
        };

        let reader = match opened {
            Ok(reader) => reader,
            // only a half the source never listed keeps its kind
            Err(err) if !present => return Err(err),
            Err(err) => {
                return Err(MigrateError::new_with_cause(
                    &format!(
                        "Can't open {} migration file for {}",
                        half.label(),
                        migration.id()
                    ),
                    ErrorKind::IOError,
                    err,
                ))
            }
        };

        read_body(reader).map_err(|err| {
            MigrateError::new_with_cause(
                &format!(
                    "Can't read {} migration file for {}",
                    half.label(),
                    migration.id()
                ),
                ErrorKind::IOError,
                err,
            )
        })
    }

    fn execute(&self, migration: &Migration, body: String) -> MigrateResult<()> {
        let statement = Statement::new(body).with_consistency(self.config.consistency());
        self.session.exec(&statement).map_err(|err| {
            log::error!("Migration {} failed: {}", migration.id(), err);
            MigrateError::new_with_cause(
                &format!("Migration {} failed", migration.id()),
                ErrorKind::ExecutionError,
                err,
            )
        })
    }

    /// Applies the next pending migration, returning its id.
    fn up_one(&self) -> MigrateResult<Option<u32>> {
        let current = self.read_state()?;
        let migration = match self.next_migration(current)? {
            Some(migration) => migration,
            None => return Ok(None),
        };

        let num = tracked_num(migration.id())?;
        let body = self.read_half(&migration, Half::Up)?;

        ensure_applied(self.session.exec_cas(&self.config.claim_stmt(num)))?;
        self.execute(&migration, body)?;
        ensure_applied(self.session.exec_cas(&self.config.update_stmt(num, false)))?;

        log::info!(
            "Applied migration {} ({}) to {}",
            migration.id(),
            migration.name(),
            self.config.table()
        );
        Ok(Some(migration.id()))
    }
}

impl Migrator for CasMigrator {
    fn up(&self) -> MigrateResult<()> {
        self.ensure_table()?;

        let mut applied = 0;
        while self.up_one()?.is_some() {
            applied += 1;
        }

        if applied == 0 {
            log::debug!("No pending migration for {}", self.config.table());
        }
        Ok(())
    }

    fn down(&self) -> MigrateResult<()> {
        self.ensure_table()?;

        let id = match self.read_state()? {
            Some(id) => id,
            None => {
                log::debug!("No migration to roll back in {}", self.config.table());
                return Ok(());
            }
        };

        let migration = self.source.get(id)?;
        let num = tracked_num(id)?;
        let body = self.read_half(&migration, Half::Down)?;

        ensure_applied(self.session.exec_cas(&self.config.update_stmt(num, true)))?;
        self.execute(&migration, body)?;
        ensure_applied(self.session.exec_cas(&self.config.release_stmt(num)))?;

        log::info!(
            "Rolled back migration {} ({}) from {}",
            id,
            migration.name(),
            self.config.table()
        );
        Ok(())
    }
}

/// Tracking rows store ids in a CQL `int`.
fn tracked_num(id: u32) -> MigrateResult<i32> {
    i32::try_from(id).map_err(|_| {
        MigrateError::new(
            &format!("Migration id {} does not fit the tracking table", id),
            ErrorKind::InvalidOperation,
        )
    })
}

fn tracked_id(num: i32) -> MigrateResult<u32> {
    u32::try_from(num).map_err(|_| {
        MigrateError::new(
            &format!("Negative migration number {} in tracking table", num),
            ErrorKind::InvalidDataType,
        )
    })
}
