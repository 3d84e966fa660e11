use cqlmigrate::errors::MigrateResult;
use cqlmigrate::migration::{CasMigrator, MapSource, MigratorConfig, Source};
use cqlmigrate::session::memory::InMemorySession;
use cqlmigrate::session::{ConditionalResult, Cursor, Session, SessionProvider, Statement};
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::{env, fs};

pub const INITIAL_UP: &str = "CREATE TABLE foo (id int PRIMARY KEY, data text)";
pub const FINAL_UP: &str = "CREATE TABLE bar (id int PRIMARY KEY, data text)";
pub const FINAL_DOWN: &str = "DROP TABLE bar";

/// The three-file catalog most tests run against: `2` has only an up body,
/// `3` has both.
pub fn fixture_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("2_initial.up.cql", INITIAL_UP),
        ("3_final.up.cql", FINAL_UP),
        ("3_final.down.cql", FINAL_DOWN),
    ]
}

pub fn fixture_source() -> Source {
    Source::new(fixture_files().into_iter().collect::<MapSource>())
}

/// Runs a test between a setup and a teardown; the teardown runs even when
/// the test panics.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(TestContext) -> MigrateResult<()>,
    B: FnOnce() -> MigrateResult<TestContext>,
    A: FnOnce(TestContext) -> MigrateResult<()>,
{
    let ctx = before().expect("test setup failed");
    let result = std::panic::catch_unwind(AssertUnwindSafe({
        let ctx = ctx.clone();
        move || test(ctx)
    }));

    if let Err(e) = after(ctx) {
        eprintln!("Warning: test teardown failed: {:?}", e);
    }

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A migration directory on disk plus an in-memory session.
#[derive(Clone)]
pub struct TestContext {
    path: String,
    session: InMemorySession,
}

impl TestContext {
    pub fn new(path: String, session: InMemorySession) -> Self {
        Self { path, session }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn session(&self) -> InMemorySession {
        self.session.clone()
    }

    pub fn migrator(&self, source: Source) -> CasMigrator {
        CasMigrator::new(
            Session::new(self.session.clone()),
            source,
            MigratorConfig::default(),
        )
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir.join(id.to_string()).to_string_lossy().to_string()
}

/// Writes `files` into `dir`, creating it if needed.
pub fn write_migrations<P: AsRef<Path>>(dir: P, files: &[(&str, &str)]) -> MigrateResult<()> {
    fs::create_dir_all(dir.as_ref())?;
    for (name, body) in files {
        fs::write(dir.as_ref().join(name), body)?;
    }
    Ok(())
}

/// A fresh directory holding the fixture catalog.
pub fn create_test_context() -> MigrateResult<TestContext> {
    let path = random_path();
    write_migrations(&path, &fixture_files())?;
    Ok(TestContext::new(path, InMemorySession::new()))
}

pub fn cleanup(ctx: TestContext) -> MigrateResult<()> {
    if Path::new(ctx.path()).exists() {
        fs::remove_dir_all(ctx.path())?;
    }
    Ok(())
}

type RaceHook = Box<dyn FnOnce(&InMemorySession) + Send>;

/// Session that lets a competitor act right before one conditional write goes
/// through, reproducing a lost race deterministically.
///
/// The hook runs once, against the same in-memory store, after this session's
/// caller has read the tracking table and before its first conditional write
/// starting with the trigger keyword reaches the store.
pub struct RaceInjectingSession {
    memory: InMemorySession,
    trigger: &'static str,
    hook: Mutex<Option<RaceHook>>,
}

impl RaceInjectingSession {
    /// Races the first `INSERT ... IF NOT EXISTS` claim.
    pub fn new<F>(memory: InMemorySession, before_claim: F) -> Arc<Self>
    where
        F: FnOnce(&InMemorySession) + Send + 'static,
    {
        RaceInjectingSession::before(memory, "INSERT", before_claim)
    }

    /// Races the first conditional write starting with `trigger`
    /// (`INSERT`, `UPDATE` or `DELETE`).
    pub fn before<F>(memory: InMemorySession, trigger: &'static str, hook: F) -> Arc<Self>
    where
        F: FnOnce(&InMemorySession) + Send + 'static,
    {
        Arc::new(RaceInjectingSession {
            memory,
            trigger,
            hook: Mutex::new(Some(Box::new(hook))),
        })
    }

    pub fn has_raced(&self) -> bool {
        self.hook.lock().is_none()
    }
}

impl SessionProvider for RaceInjectingSession {
    fn exec(&self, statement: &Statement) -> MigrateResult<()> {
        self.memory.exec(statement)
    }

    fn exec_cas(&self, statement: &Statement) -> MigrateResult<ConditionalResult> {
        if statement.cql().trim_start().starts_with(self.trigger) {
            let hook = self.hook.lock().take();
            if let Some(hook) = hook {
                log::debug!("Injecting competitor before: {}", statement);
                hook(&self.memory);
            }
        }
        self.memory.exec_cas(statement)
    }

    fn query(&self, statement: &Statement) -> Cursor {
        self.memory.query(statement)
    }
}
