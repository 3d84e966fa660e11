use crate::common::Row;
use crate::errors::{MigrateError, MigrateResult};
use std::collections::VecDeque;

/// Row-by-row access to a query result.
///
/// Errors met while fetching are deferred to `close`, so callers drain the
/// rows first and then learn whether the read was complete.
pub trait CursorProvider: Send {
    /// Returns the next row, or `None` once the result is exhausted or failed.
    fn next_row(&mut self) -> Option<Row>;

    /// Releases the cursor, reporting any error met while fetching.
    fn close(&mut self) -> MigrateResult<()>;
}

/// Handle over a `CursorProvider`, iterable as `Row`s.
pub struct Cursor {
    inner: Box<dyn CursorProvider>,
}

impl Cursor {
    pub fn new<T: CursorProvider + 'static>(inner: T) -> Self {
        Cursor {
            inner: Box::new(inner),
        }
    }

    /// A cursor over rows that are already in memory.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Cursor::new(BufferedCursor {
            rows: rows.into(),
            error: None,
        })
    }

    /// A cursor yielding no rows whose `close` reports `error`.
    pub fn from_error(error: MigrateError) -> Self {
        Cursor::new(BufferedCursor {
            rows: VecDeque::new(),
            error: Some(error),
        })
    }

    pub fn close(mut self) -> MigrateResult<()> {
        self.inner.close()
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_row()
    }
}

struct BufferedCursor {
    rows: VecDeque<Row>,
    error: Option<MigrateError>,
}

impl CursorProvider for BufferedCursor {
    fn next_row(&mut self) -> Option<Row> {
        if self.error.is_some() {
            return None;
        }
        self.rows.pop_front()
    }

    fn close(&mut self) -> MigrateResult<()> {
        self.rows.clear();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
