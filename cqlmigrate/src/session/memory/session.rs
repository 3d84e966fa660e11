use super::parser::TrackingStatement;
use super::table::InMemoryTable;
use crate::common::{FromCqlValue, Row};
use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::session::{ConditionalResult, Cursor, SessionProvider, Statement};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory implementation of a CQL session.
///
/// # Purpose
/// `InMemorySession` stands in for a cluster in tests and embedded setups. It
/// understands the statements issued against a migration tracking table, for
/// any table name, and treats every other statement as a migration body.
///
/// # Characteristics
/// - **Linearizable CAS**: conditional writes on a table are serialized, so
///   among racing claims on the same number exactly one is applied
/// - **Body journal**: executed bodies are recorded in order, see `executed()`
/// - **Failure injection**: bodies containing a fragment registered with
///   `fail_on` fail with `ExecutionError`
/// - **Strict tables**: reading or writing a table that was never created is
///   a `BackendError`, like an unconfigured table on a real cluster
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemorySession {
    inner: Arc<InMemorySessionInner>,
}

impl InMemorySession {
    pub fn new() -> InMemorySession {
        InMemorySession::default()
    }

    /// Makes every body containing `fragment` fail.
    pub fn fail_on(&self, fragment: &str) {
        self.inner.failing.lock().push(fragment.to_string());
    }

    /// Bodies executed successfully so far, trimmed, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.journal.lock().clone()
    }

    /// Number of writes received for tracking tables, table creation excluded.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.inner.tables.contains_key(table)
    }

    /// `(num, dirty)` pairs of a tracking table in ascending order, empty if the
    /// table does not exist.
    pub fn tracking_rows(&self, table: &str) -> Vec<(i32, bool)> {
        self.inner
            .tables
            .get(table)
            .map(|t| t.snapshot())
            .unwrap_or_default()
    }

    /// Seeds a tracking row, creating the table when needed. Not counted as a
    /// write.
    pub fn insert_row(&self, table: &str, num: i32, dirty: bool) {
        self.inner
            .tables
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(InMemoryTable::new()))
            .put(num, dirty, Utc::now());
    }
}

impl SessionProvider for InMemorySession {
    fn exec(&self, statement: &Statement) -> MigrateResult<()> {
        self.inner.exec(statement)
    }

    fn exec_cas(&self, statement: &Statement) -> MigrateResult<ConditionalResult> {
        self.inner.exec_cas(statement)
    }

    fn query(&self, statement: &Statement) -> Cursor {
        self.inner.query(statement)
    }
}

#[derive(Default)]
struct InMemorySessionInner {
    tables: DashMap<String, Arc<InMemoryTable>>,
    journal: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
    writes: AtomicUsize,
}

impl InMemorySessionInner {
    fn exec(&self, statement: &Statement) -> MigrateResult<()> {
        match TrackingStatement::parse(statement.cql()) {
            Some(TrackingStatement::CreateTable { table }) => {
                self.tables
                    .entry(table)
                    .or_insert_with(|| Arc::new(InMemoryTable::new()));
                Ok(())
            }
            Some(TrackingStatement::Fetch { table }) => self.table(&table).map(|_| ()),
            // without result handling a conditional write still applies or not
            Some(tracking) => self.conditional(&tracking, statement).map(|_| ()),
            None => self.exec_body(statement),
        }
    }

    fn exec_cas(&self, statement: &Statement) -> MigrateResult<ConditionalResult> {
        match TrackingStatement::parse(statement.cql()) {
            Some(tracking) if tracking.is_conditional() => self.conditional(&tracking, statement),
            _ => Err(MigrateError::new(
                &format!("Statement is not a conditional write: {}", statement),
                ErrorKind::InvalidOperation,
            )),
        }
    }

    fn query(&self, statement: &Statement) -> Cursor {
        match TrackingStatement::parse(statement.cql()) {
            Some(TrackingStatement::Fetch { table }) => match self.table(&table) {
                Ok(t) => Cursor::from_rows(t.rows()),
                Err(err) => Cursor::from_error(err),
            },
            _ => Cursor::from_error(MigrateError::new(
                &format!("Unsupported query: {}", statement),
                ErrorKind::BackendError,
            )),
        }
    }

    fn conditional(
        &self,
        tracking: &TrackingStatement,
        statement: &Statement,
    ) -> MigrateResult<ConditionalResult> {
        match tracking {
            TrackingStatement::Claim { table } => {
                let table = self.table(table)?;
                let num: i32 = bound(statement, 0)?;
                let created_at: DateTime<Utc> = bound(statement, 1)?;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(table.insert_if_absent(num, created_at))
            }
            TrackingStatement::Update { table } => {
                let table = self.table(table)?;
                let dirty: bool = bound(statement, 0)?;
                let num: i32 = bound(statement, 1)?;
                let expected: bool = bound(statement, 2)?;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(table.update_if_dirty_is(num, dirty, expected))
            }
            TrackingStatement::Release { table } => {
                let table = self.table(table)?;
                let num: i32 = bound(statement, 0)?;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(table.delete_if_exists(num))
            }
            _ => Err(MigrateError::new(
                &format!("Statement is not a conditional write: {}", statement),
                ErrorKind::InvalidOperation,
            )),
        }
    }

    fn exec_body(&self, statement: &Statement) -> MigrateResult<()> {
        let body = statement.cql().trim();
        let failing = self
            .failing
            .lock()
            .iter()
            .any(|fragment| body.contains(fragment.as_str()));

        if failing {
            return Err(MigrateError::new(
                &format!("Invalid query: {}", body),
                ErrorKind::ExecutionError,
            ));
        }

        self.journal.lock().push(body.to_string());
        Ok(())
    }

    fn table(&self, name: &str) -> MigrateResult<Arc<InMemoryTable>> {
        self.tables
            .get(name)
            .map(|t| t.value().clone())
            .ok_or_else(|| {
                MigrateError::new(
                    &format!("unconfigured table {}", name),
                    ErrorKind::BackendError,
                )
            })
    }
}

fn bound<T: FromCqlValue>(statement: &Statement, index: usize) -> MigrateResult<T> {
    let row = Row::new(statement.values().to_vec());
    row.get::<T>(index).map_err(|err| {
        MigrateError::new_with_cause(
            &format!("Bad bound value ${} for: {}", index + 1, statement),
            ErrorKind::InvalidOperation,
            err,
        )
    })
}
