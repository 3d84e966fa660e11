use crate::errors::{MigrateError, MigrateResult};
use crate::migration::{Migration, SourceProvider};
use std::sync::Arc;

const SINGLE_MIGRATION_ID: u32 = 1;

/// A source made of exactly one migration, with id 1.
///
/// Handy for test harnesses that need a schema in place before running:
/// `up` applies the given body once, `down` rolls it back.
#[derive(Clone, Debug)]
pub struct SingleMigrationSource {
    migration: Migration,
}

impl SingleMigrationSource {
    pub fn new(up: &str, down: &str) -> SingleMigrationSource {
        let up = up.to_string();
        let down = down.to_string();

        let migration = Migration::new(
            SINGLE_MIGRATION_ID,
            "1_single",
            Some("up".to_string()),
            Some("down".to_string()),
            Arc::new(move |half: &str| -> MigrateResult<Vec<u8>> {
                match half {
                    "up" => Ok(up.as_bytes().to_vec()),
                    _ => Ok(down.as_bytes().to_vec()),
                }
            }),
        );
        SingleMigrationSource { migration }
    }
}

impl SourceProvider for SingleMigrationSource {
    fn get(&self, id: u32) -> MigrateResult<Migration> {
        ensure_single(id)?;
        Ok(self.migration.clone())
    }

    fn first(&self) -> MigrateResult<Migration> {
        Ok(self.migration.clone())
    }

    fn next(&self, id: u32) -> MigrateResult<Option<u32>> {
        ensure_single(id)?;
        Ok(None)
    }

    fn prev(&self, id: u32) -> MigrateResult<Option<u32>> {
        ensure_single(id)?;
        Ok(None)
    }
}

fn ensure_single(id: u32) -> MigrateResult<()> {
    if id != SINGLE_MIGRATION_ID {
        return Err(MigrateError::not_exist());
    }
    Ok(())
}
