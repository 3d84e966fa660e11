use crate::common::Row;
use crate::errors::{MigrateError, MigrateResult};
use crate::session::{ConditionalResult, Cursor, CursorProvider, Session, SessionProvider, Statement};
use itertools::Itertools;
use log::Level;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Kind of session call being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Exec,
    ExecCas,
    Query,
}

impl Display for OpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OpType::Exec => write!(f, "Exec"),
            OpType::ExecCas => write!(f, "ExecCAS"),
            OpType::Query => write!(f, "Query"),
        }
    }
}

/// Session middleware that logs every statement it forwards.
///
/// Each record carries the op type, the elapsed time, the bound values as
/// `$1`, `$2`, ... and, depending on the call, the applied flag of a
/// conditional write or the number of rows scanned by a query. Failed calls
/// are logged with their error at the same level.
///
/// ```rust
/// use cqlmigrate::session::memory::InMemorySession;
/// use cqlmigrate::session::{LoggingSession, Session};
///
/// let session = Session::new(LoggingSession::new(Session::new(InMemorySession::new())));
/// ```
pub struct LoggingSession {
    inner: Session,
    level: Level,
}

impl LoggingSession {
    /// Logs at `Debug`.
    pub fn new(inner: Session) -> Self {
        LoggingSession::with_level(inner, Level::Debug)
    }

    pub fn with_level(inner: Session, level: Level) -> Self {
        LoggingSession { inner, level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl SessionProvider for LoggingSession {
    fn exec(&self, statement: &Statement) -> MigrateResult<()> {
        let started = Instant::now();
        let result = self.inner.exec(statement);

        log_statement(
            self.level,
            OpType::Exec,
            statement,
            started.elapsed(),
            result.as_ref().err(),
            "",
        );
        result
    }

    fn exec_cas(&self, statement: &Statement) -> MigrateResult<ConditionalResult> {
        let started = Instant::now();
        let result = self.inner.exec_cas(statement);

        let applied = match &result {
            Ok(r) => format!(" applied={}", r.is_applied()),
            Err(_) => String::new(),
        };
        log_statement(
            self.level,
            OpType::ExecCas,
            statement,
            started.elapsed(),
            result.as_ref().err(),
            &applied,
        );
        result
    }

    fn query(&self, statement: &Statement) -> Cursor {
        Cursor::new(LoggingCursor {
            inner: Some(self.inner.query(statement)),
            statement: statement.clone(),
            level: self.level,
            started: Instant::now(),
            scanned: 0,
        })
    }
}

/// Counts the rows read and logs the query once the cursor is closed.
struct LoggingCursor {
    inner: Option<Cursor>,
    statement: Statement,
    level: Level,
    started: Instant,
    scanned: usize,
}

impl CursorProvider for LoggingCursor {
    fn next_row(&mut self) -> Option<Row> {
        let row = self.inner.as_mut()?.next();
        if row.is_some() {
            self.scanned += 1;
        }
        row
    }

    fn close(&mut self) -> MigrateResult<()> {
        let result = match self.inner.take() {
            Some(cursor) => cursor.close(),
            None => Ok(()),
        };

        log_statement(
            self.level,
            OpType::Query,
            &self.statement,
            self.started.elapsed(),
            result.as_ref().err(),
            &format!(" scanned={}", self.scanned),
        );
        result
    }
}

fn log_statement(
    level: Level,
    op: OpType,
    statement: &Statement,
    elapsed: Duration,
    error: Option<&MigrateError>,
    extra: &str,
) {
    if !log::log_enabled!(level) {
        return;
    }

    let values = statement
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| format!(" ${}={}", i + 1, v))
        .join("");

    match error {
        Some(err) => log::log!(
            level,
            "{} [op type={} duration={:?}{}{}] error: {}",
            statement,
            op,
            elapsed,
            values,
            extra,
            err
        ),
        None => log::log!(
            level,
            "{} [op type={} duration={:?}{}{}]",
            statement,
            op,
            elapsed,
            values,
            extra
        ),
    }
}
