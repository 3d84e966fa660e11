use crate::common::CqlValue;
use crate::errors::{ErrorKind, MigrateError};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Consistency level requested for a statement.
///
/// Discriminants are the native protocol codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum Consistency {
    Any = 0,
    One = 1,
    Two = 2,
    Three = 3,
    #[default]
    Quorum = 4,
    All = 5,
    LocalQuorum = 6,
    EachQuorum = 7,
    LocalOne = 10,
}

impl Consistency {
    /// Returns the native protocol code of this level.
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

impl Display for Consistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Consistency::Any => "Any",
            Consistency::One => "One",
            Consistency::Two => "Two",
            Consistency::Three => "Three",
            Consistency::Quorum => "Quorum",
            Consistency::All => "All",
            Consistency::LocalQuorum => "LocalQuorum",
            Consistency::EachQuorum => "EachQuorum",
            Consistency::LocalOne => "LocalOne",
        };
        write!(f, "{}", name)
    }
}

impl TryFrom<u16> for Consistency {
    type Error = MigrateError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Consistency::Any),
            1 => Ok(Consistency::One),
            2 => Ok(Consistency::Two),
            3 => Ok(Consistency::Three),
            4 => Ok(Consistency::Quorum),
            5 => Ok(Consistency::All),
            6 => Ok(Consistency::LocalQuorum),
            7 => Ok(Consistency::EachQuorum),
            10 => Ok(Consistency::LocalOne),
            other => Err(MigrateError::new(
                &format!("Unknown consistency code: Consistency({})", other),
                ErrorKind::InvalidOperation,
            )),
        }
    }
}

/// A CQL statement with its bound values and options.
///
/// # Examples
///
/// ```rust
/// use cqlmigrate::session::{Consistency, Statement};
///
/// let stmt = Statement::new("DELETE FROM migrations WHERE num = ? IF EXISTS")
///     .bind(3)
///     .with_consistency(Consistency::LocalQuorum);
///
/// assert_eq!(stmt.values().len(), 1);
/// assert_eq!(stmt.consistency(), Some(Consistency::LocalQuorum));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    cql: String,
    values: SmallVec<[CqlValue; 4]>,
    consistency: Option<Consistency>,
}

impl Statement {
    pub fn new(cql: impl Into<String>) -> Self {
        Statement {
            cql: cql.into(),
            values: SmallVec::new(),
            consistency: None,
        }
    }

    /// Appends a positional value for the next `?` marker.
    pub fn bind(mut self, value: impl Into<CqlValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    /// The requested level, `None` meaning the session default.
    pub fn consistency(&self) -> Option<Consistency> {
        self.consistency
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cql.trim())
    }
}
