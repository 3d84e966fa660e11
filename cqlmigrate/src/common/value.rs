use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// A CQL value bound to a statement or read back from a row.
///
/// Only the types the tracking table and the migration engine exchange with
/// the store are modelled. Drivers map them onto their native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Null,
    Int(i32),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl CqlValue {
    /// Returns the CQL type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Int(_) => "int",
            CqlValue::Boolean(_) => "boolean",
            CqlValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }
}

impl Display for CqlValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CqlValue::Null => write!(f, "null"),
            CqlValue::Int(v) => write!(f, "{}", v),
            CqlValue::Boolean(v) => write!(f, "{}", v),
            CqlValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<i32> for CqlValue {
    fn from(value: i32) -> Self {
        CqlValue::Int(value)
    }
}

impl From<bool> for CqlValue {
    fn from(value: bool) -> Self {
        CqlValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for CqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        CqlValue::Timestamp(value)
    }
}

/// Conversion from a column value into a Rust type.
pub trait FromCqlValue: Sized {
    fn from_cql(value: &CqlValue) -> MigrateResult<Self>;
}

fn type_mismatch(expected: &str, found: &CqlValue) -> MigrateError {
    MigrateError::new(
        &format!("Expected a {} column, found {}", expected, found.type_name()),
        ErrorKind::InvalidDataType,
    )
}

impl FromCqlValue for i32 {
    fn from_cql(value: &CqlValue) -> MigrateResult<Self> {
        match value {
            CqlValue::Int(v) => Ok(*v),
            other => Err(type_mismatch("int", other)),
        }
    }
}

impl FromCqlValue for bool {
    fn from_cql(value: &CqlValue) -> MigrateResult<Self> {
        match value {
            CqlValue::Boolean(v) => Ok(*v),
            other => Err(type_mismatch("boolean", other)),
        }
    }
}

impl FromCqlValue for DateTime<Utc> {
    fn from_cql(value: &CqlValue) -> MigrateResult<Self> {
        match value {
            CqlValue::Timestamp(v) => Ok(*v),
            other => Err(type_mismatch("timestamp", other)),
        }
    }
}

impl<T: FromCqlValue> FromCqlValue for Option<T> {
    fn from_cql(value: &CqlValue) -> MigrateResult<Self> {
        match value {
            CqlValue::Null => Ok(None),
            other => T::from_cql(other).map(Some),
        }
    }
}

/// An ordered set of column values returned by a query or a conditional write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: SmallVec<[CqlValue; 4]>,
}

impl Row {
    pub fn new(columns: Vec<CqlValue>) -> Self {
        Row {
            columns: SmallVec::from_vec(columns),
        }
    }

    pub fn empty() -> Self {
        Row::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[CqlValue] {
        &self.columns
    }

    /// Reads the column at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDataType` when the column is missing or holds another type.
    pub fn get<T: FromCqlValue>(&self, index: usize) -> MigrateResult<T> {
        match self.columns.get(index) {
            Some(value) => T::from_cql(value),
            None => Err(MigrateError::new(
                &format!("Row has no column at index {}", index),
                ErrorKind::InvalidDataType,
            )),
        }
    }
}

impl From<Vec<CqlValue>> for Row {
    fn from(columns: Vec<CqlValue>) -> Self {
        Row::new(columns)
    }
}
