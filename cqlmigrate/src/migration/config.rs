use crate::common::{
    render, Clock, SystemClock, CLAIM_MIGRATION_STMT_TEMPLATE, CREATE_TABLE_STMT_TEMPLATE,
    DEFAULT_MIGRATION_TABLE, FETCH_MIGRATIONS_STMT_TEMPLATE, RELEASE_MIGRATION_STMT_TEMPLATE,
    UPDATE_MIGRATION_STMT_TEMPLATE,
};
use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::session::{Consistency, Statement};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)?$")
        .expect("valid table name pattern")
});

/// Settings of a `CasMigrator`.
///
/// Immutable once built and cheap to clone. Holds the tracking table name
/// (optionally keyspace-qualified), the consistency attached to every statement
/// the migrator issues, and the clock stamping `created_at`.
///
/// # Examples
///
/// ```rust
/// use cqlmigrate::migration::MigratorConfig;
/// use cqlmigrate::session::Consistency;
///
/// let config = MigratorConfig::builder()
///     .table("app.schema_migrations")
///     .consistency(Consistency::LocalQuorum)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.table(), "app.schema_migrations");
/// assert_eq!(config.consistency(), Consistency::LocalQuorum);
/// ```
#[derive(Clone)]
pub struct MigratorConfig {
    inner: Arc<MigratorConfigInner>,
}

struct MigratorConfigInner {
    table: String,
    consistency: Consistency,
    clock: Arc<dyn Clock>,
}

impl MigratorConfig {
    pub fn builder() -> MigratorConfigBuilder {
        MigratorConfigBuilder::new()
    }

    pub fn table(&self) -> &str {
        &self.inner.table
    }

    pub fn consistency(&self) -> Consistency {
        self.inner.consistency
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    pub fn create_table_stmt(&self) -> Statement {
        self.statement(CREATE_TABLE_STMT_TEMPLATE)
    }

    pub fn fetch_stmt(&self) -> Statement {
        self.statement(FETCH_MIGRATIONS_STMT_TEMPLATE)
    }

    /// Claims `num` with a dirty row stamped with the configured clock.
    pub fn claim_stmt(&self, num: i32) -> Statement {
        self.statement(CLAIM_MIGRATION_STMT_TEMPLATE)
            .bind(num)
            .bind(self.now())
    }

    /// Sets the dirty flag of `num` to `dirty`, provided it currently holds
    /// the opposite value.
    pub fn update_stmt(&self, num: i32, dirty: bool) -> Statement {
        self.statement(UPDATE_MIGRATION_STMT_TEMPLATE)
            .bind(dirty)
            .bind(num)
            .bind(!dirty)
    }

    pub fn release_stmt(&self, num: i32) -> Statement {
        self.statement(RELEASE_MIGRATION_STMT_TEMPLATE).bind(num)
    }

    fn statement(&self, template: &str) -> Statement {
        Statement::new(render(template, &self.inner.table)).with_consistency(self.inner.consistency)
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        MigratorConfig {
            inner: Arc::new(MigratorConfigInner {
                table: DEFAULT_MIGRATION_TABLE.to_string(),
                consistency: Consistency::default(),
                clock: Arc::new(SystemClock),
            }),
        }
    }
}

impl Debug for MigratorConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigratorConfig")
            .field("table", &self.inner.table)
            .field("consistency", &self.inner.consistency)
            .finish()
    }
}

/// Builder for `MigratorConfig`; unset fields keep their defaults.
pub struct MigratorConfigBuilder {
    table: String,
    consistency: Consistency,
    clock: Arc<dyn Clock>,
}

impl MigratorConfigBuilder {
    pub fn new() -> MigratorConfigBuilder {
        MigratorConfigBuilder {
            table: DEFAULT_MIGRATION_TABLE.to_string(),
            consistency: Consistency::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validates the table name and freezes the configuration.
    pub fn build(self) -> MigrateResult<MigratorConfig> {
        if !TABLE_NAME.is_match(&self.table) {
            log::error!("Invalid migration table name {:?}", self.table);
            return Err(MigrateError::new(
                &format!("Invalid migration table name: {:?}", self.table),
                ErrorKind::InvalidOperation,
            ));
        }

        Ok(MigratorConfig {
            inner: Arc::new(MigratorConfigInner {
                table: self.table,
                consistency: self.consistency,
                clock: self.clock,
            }),
        })
    }
}

impl Default for MigratorConfigBuilder {
    fn default() -> Self {
        MigratorConfigBuilder::new()
    }
}
