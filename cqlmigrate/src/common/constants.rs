// Tracking table
pub const DEFAULT_MIGRATION_TABLE: &str = "migrations";

pub const CREATE_TABLE_STMT_TEMPLATE: &str = "
CREATE TABLE IF NOT EXISTS {table} (
	num int,
	dirty boolean,
	created_at timestamp,
	PRIMARY KEY (num)
)
	";

pub const FETCH_MIGRATIONS_STMT_TEMPLATE: &str = "SELECT num, dirty FROM {table}";
pub const CLAIM_MIGRATION_STMT_TEMPLATE: &str =
    "INSERT INTO {table}(num, dirty, created_at) VALUES(?, true, ?) IF NOT EXISTS";
pub const UPDATE_MIGRATION_STMT_TEMPLATE: &str =
    "UPDATE {table} SET dirty = ? WHERE num = ? IF dirty = ?";
pub const RELEASE_MIGRATION_STMT_TEMPLATE: &str = "DELETE FROM {table} WHERE num = ? IF EXISTS";

pub const TABLE_PLACEHOLDER: &str = "{table}";

// Migration files: <id>_<name>.<up|down>.cql
pub const MIGRATION_FILE_EXTENSION: &str = "cql";
pub const MIGRATION_UP: &str = "up";
pub const MIGRATION_DOWN: &str = "down";
pub const MIGRATION_ID_SEPARATOR: char = '_';

/// Renders a statement template for the given table name.
#[inline]
pub fn render(template: &str, table: &str) -> String {
    template.replace(TABLE_PLACEHOLDER, table)
}
