use crate::common::Row;
use crate::errors::{MigrateError, MigrateResult};

/// Outcome of a conditional (lightweight transaction) write.
///
/// When the condition does not hold the store returns the current values of
/// the row in `existing`; an applied write usually leaves it empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalResult {
    applied: bool,
    existing: Row,
}

impl ConditionalResult {
    pub fn applied() -> Self {
        ConditionalResult {
            applied: true,
            existing: Row::empty(),
        }
    }

    pub fn rejected(existing: Row) -> Self {
        ConditionalResult {
            applied: false,
            existing,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub fn existing(&self) -> &Row {
        &self.existing
    }
}

/// Turns the result of a conditional write into a plain outcome.
///
/// Session errors are returned unchanged. A write that was not applied means
/// another migrator changed the row first and yields `ConcurrentMigration`.
pub fn ensure_applied(result: MigrateResult<ConditionalResult>) -> MigrateResult<()> {
    let result = result?;

    if !result.is_applied() {
        log::warn!(
            "Conditional write was not applied, current row: {:?}",
            result.existing().columns()
        );
        return Err(MigrateError::concurrent_migration());
    }

    Ok(())
}
