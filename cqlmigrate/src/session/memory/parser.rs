use regex::Regex;
use std::sync::LazyLock;

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*CREATE\s+TABLE\s+IF\s+NOT\s+EXISTS\s+([\w.]+)\s*\(\s*num\s+int\s*,\s*dirty\s+boolean\s*,\s*created_at\s+timestamp\s*,\s*PRIMARY\s+KEY\s*\(\s*num\s*\)\s*\)\s*;?\s*$",
    )
    .expect("valid create table pattern")
});

static FETCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+num\s*,\s*dirty\s+FROM\s+([\w.]+)\s*;?\s*$")
        .expect("valid fetch pattern")
});

static CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*INSERT\s+INTO\s+([\w.]+)\s*\(\s*num\s*,\s*dirty\s*,\s*created_at\s*\)\s*VALUES\s*\(\s*\?\s*,\s*true\s*,\s*\?\s*\)\s+IF\s+NOT\s+EXISTS\s*;?\s*$",
    )
    .expect("valid claim pattern")
});

static UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*UPDATE\s+([\w.]+)\s+SET\s+dirty\s*=\s*\?\s+WHERE\s+num\s*=\s*\?\s+IF\s+dirty\s*=\s*\?\s*;?\s*$",
    )
    .expect("valid update pattern")
});

static RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*DELETE\s+FROM\s+([\w.]+)\s+WHERE\s+num\s*=\s*\?\s+IF\s+EXISTS\s*;?\s*$")
        .expect("valid release pattern")
});

/// The tracking-table statement shapes the in-memory session understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TrackingStatement {
    CreateTable { table: String },
    Fetch { table: String },
    Claim { table: String },
    Update { table: String },
    Release { table: String },
}

impl TrackingStatement {
    /// Recognizes a tracking-table statement; anything else is a migration body.
    pub(crate) fn parse(cql: &str) -> Option<TrackingStatement> {
        let table = |re: &Regex| {
            re.captures(cql)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        if let Some(table) = table(&CREATE_TABLE) {
            return Some(TrackingStatement::CreateTable { table });
        }
        if let Some(table) = table(&FETCH) {
            return Some(TrackingStatement::Fetch { table });
        }
        if let Some(table) = table(&CLAIM) {
            return Some(TrackingStatement::Claim { table });
        }
        if let Some(table) = table(&UPDATE) {
            return Some(TrackingStatement::Update { table });
        }
        table(&RELEASE).map(|table| TrackingStatement::Release { table })
    }

    pub(crate) fn is_conditional(&self) -> bool {
        matches!(
            self,
            TrackingStatement::Claim { .. }
                | TrackingStatement::Update { .. }
                | TrackingStatement::Release { .. }
        )
    }
}
