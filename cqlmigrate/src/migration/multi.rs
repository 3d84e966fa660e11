use crate::errors::{MigrateError, MigrateResult};
use crate::migration::Migrator;

/// Runs several independent migrators as one.
///
/// Every constituent runs on each call, in insertion order, whatever the
/// others return. A single failure is returned unchanged; several are folded
/// into one `MultipleErrors` error listing them in `related()`.
#[derive(Default)]
pub struct MultiMigrator {
    migrators: Vec<Box<dyn Migrator>>,
}

impl MultiMigrator {
    pub fn new(migrators: Vec<Box<dyn Migrator>>) -> Self {
        MultiMigrator { migrators }
    }

    pub fn with<M: Migrator + 'static>(mut self, migrator: M) -> Self {
        self.migrators.push(Box::new(migrator));
        self
    }

    pub fn len(&self) -> usize {
        self.migrators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrators.is_empty()
    }

    fn run_all<F>(&self, op: F) -> MigrateResult<()>
    where
        F: Fn(&dyn Migrator) -> MigrateResult<()>,
    {
        let errors: Vec<MigrateError> = self
            .migrators
            .iter()
            .filter_map(|m| op(m.as_ref()).err())
            .collect();

        if !errors.is_empty() {
            log::warn!(
                "{} of {} migrators failed",
                errors.len(),
                self.migrators.len()
            );
        }
        MigrateError::combine(errors)
    }
}

impl Migrator for MultiMigrator {
    fn up(&self) -> MigrateResult<()> {
        self.run_all(|m| m.up())
    }

    fn down(&self) -> MigrateResult<()> {
        self.run_all(|m| m.down())
    }
}
