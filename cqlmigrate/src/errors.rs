use backtrace::Backtrace;
use itertools::Itertools;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for migration operations
///
/// Each kind describes one category of failure so callers can decide whether
/// to retry (`ConcurrentMigration`), escalate to an operator (`Dirty`) or fix
/// their migration catalog (`NotExist`, `IOError`, `ExecutionError`).
///
/// # Examples
///
/// ```rust
/// use cqlmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
///
/// fn example() -> MigrateResult<()> {
///     Err(MigrateError::new("Migration 3 is dirty", ErrorKind::Dirty))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::Dirty);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The requested migration, body or id is absent from the source
    NotExist,
    /// The tracking table holds a dirty row left by an incomplete run
    Dirty,
    /// A conditional write was not applied: another migrator won the race
    ConcurrentMigration,
    /// Reading a migration body or listing a source failed
    IOError,
    /// A migration body failed against the store
    ExecutionError,
    /// Error from the session layer (table creation, queries, unknown tables)
    BackendError,
    /// The operation or configuration is not valid
    InvalidOperation,
    /// A stored value does not have the expected type or range
    InvalidDataType,
    /// Several independent migrators failed
    MultipleErrors,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotExist => write!(f, "Not exist"),
            ErrorKind::Dirty => write!(f, "Dirty migration"),
            ErrorKind::ConcurrentMigration => write!(f, "Concurrent migration"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::MultipleErrors => write!(f, "Multiple errors"),
        }
    }
}

/// Error type of the migration engine.
///
/// `MigrateError` carries a message, a kind, an optional cause and the backtrace
/// captured where it was created. Errors aggregated by a `MultiMigrator` are
/// kept in `related()`.
#[derive(Clone)]
pub struct MigrateError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MigrateError>>,
    related: Vec<MigrateError>,
    backtrace: Arc<Backtrace>,
}

impl MigrateError {
    /// Creates a new `MigrateError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MigrateError {
            message: message.to_string(),
            error_kind,
            cause: None,
            related: Vec::new(),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `MigrateError` with a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MigrateError) -> Self {
        MigrateError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            related: Vec::new(),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn not_exist() -> Self {
        MigrateError::new("This migration does not exist", ErrorKind::NotExist)
    }

    /// A tracking row left dirty by an incomplete run.
    pub fn dirty(id: u32) -> Self {
        MigrateError::new(&format!("Migration {} is dirty", id), ErrorKind::Dirty)
    }

    pub fn concurrent_migration() -> Self {
        MigrateError::new(
            "Concurrent migration running",
            ErrorKind::ConcurrentMigration,
        )
    }

    /// Folds the errors of independent runs into one result.
    ///
    /// No errors gives `Ok(())`, a single error is returned unchanged, and
    /// several errors are wrapped in one `MultipleErrors` error whose
    /// `related()` lists them in order.
    pub fn combine(mut errors: Vec<MigrateError>) -> MigrateResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            count => {
                let summary = errors.iter().map(|e| e.message()).join("; ");

                let mut error = MigrateError::new(
                    &format!("{} migrations failed: {}", count, summary),
                    ErrorKind::MultipleErrors,
                );
                error.related = errors;
                Err(error)
            }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MigrateError> {
        self.cause.as_deref()
    }

    pub fn related(&self) -> &[MigrateError] {
        &self.related
    }
}

impl Display for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for MigrateError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        MigrateError::new(
            &format!("Migration body is not valid UTF-8: {}", err),
            ErrorKind::IOError,
        )
    }
}
