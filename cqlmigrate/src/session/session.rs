use crate::errors::MigrateResult;
use crate::session::{ConditionalResult, Cursor, Statement};
use std::ops::Deref;
use std::sync::Arc;

/// Contract the migration engine consumes from the database layer.
///
/// # Purpose
/// Abstracts the statement-execution client (a driver session, a test double,
/// a middleware chain) behind the three operations the engine needs. Connection
/// management, prepared statements, paging and timeouts are the implementation's
/// concern.
///
/// # Guarantees expected from implementations
/// - `exec_cas` must be linearizable per partition key: among concurrent
///   conditional writes on the same key, the condition is evaluated and the
///   write applied atomically, so at most one of them wins.
/// - Every call may block; cancellation and timeouts are honored here, not
///   in the engine.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one session is shared by every migrator
/// of a process.
pub trait SessionProvider: Send + Sync {
    /// Executes a statement, discarding any result rows.
    fn exec(&self, statement: &Statement) -> MigrateResult<()>;

    /// Executes a conditional statement (`IF NOT EXISTS`, `IF EXISTS`,
    /// `IF <column> = ?`) and reports whether it was applied.
    fn exec_cas(&self, statement: &Statement) -> MigrateResult<ConditionalResult>;

    /// Runs a query. Errors surface from `Cursor::close`.
    fn query(&self, statement: &Statement) -> Cursor;
}

/// Cheap-to-clone handle over a `SessionProvider`.
///
/// # Usage Example
/// ```rust
/// use cqlmigrate::session::memory::InMemorySession;
/// use cqlmigrate::session::{Session, Statement};
///
/// let session = Session::new(InMemorySession::new());
/// session.exec(&Statement::new("CREATE TABLE IF NOT EXISTS migrations (num int, dirty boolean, created_at timestamp, PRIMARY KEY (num))")).unwrap();
/// let rows: Vec<_> = session.query(&Statement::new("SELECT num, dirty FROM migrations")).collect();
/// assert!(rows.is_empty());
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<dyn SessionProvider>,
}

impl Session {
    pub fn new<T: SessionProvider + 'static>(inner: T) -> Self {
        Session {
            inner: Arc::new(inner),
        }
    }

    /// Wraps a provider that is already shared, keeping access to its
    /// concrete type through the caller's `Arc`.
    pub fn from_arc<T: SessionProvider + 'static>(inner: Arc<T>) -> Self {
        Session { inner }
    }
}

impl Deref for Session {
    type Target = Arc<dyn SessionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
