use crate::common::{CqlValue, Row};
use crate::session::ConditionalResult;
use chrono::{DateTime, Utc};
use crossbeam_skiplist::SkipMap;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrackingRow {
    pub(crate) dirty: bool,
    pub(crate) created_at: DateTime<Utc>,
}

/// A tracking table kept in memory, ordered by migration number.
///
/// Reads go straight to the skip list. Conditional writes hold `write_lock`
/// while they evaluate their condition and apply, so two writers on the same
/// key never both succeed.
pub(crate) struct InMemoryTable {
    rows: SkipMap<i32, TrackingRow>,
    write_lock: Mutex<()>,
}

impl InMemoryTable {
    pub(crate) fn new() -> Self {
        InMemoryTable {
            rows: SkipMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|entry| {
                Row::new(vec![
                    CqlValue::Int(*entry.key()),
                    CqlValue::Boolean(entry.value().dirty),
                ])
            })
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Vec<(i32, bool)> {
        self.rows
            .iter()
            .map(|entry| (*entry.key(), entry.value().dirty))
            .collect()
    }

    /// `INSERT ... IF NOT EXISTS`
    pub(crate) fn insert_if_absent(&self, num: i32, created_at: DateTime<Utc>) -> ConditionalResult {
        let _guard = self.write_lock.lock();
        if let Some(entry) = self.rows.get(&num) {
            let row = entry.value();
            return ConditionalResult::rejected(Row::new(vec![
                CqlValue::Int(num),
                CqlValue::Boolean(row.dirty),
                CqlValue::Timestamp(row.created_at),
            ]));
        }

        self.rows.insert(
            num,
            TrackingRow {
                dirty: true,
                created_at,
            },
        );
        ConditionalResult::applied()
    }

    /// `UPDATE ... SET dirty = ? WHERE num = ? IF dirty = ?`
    pub(crate) fn update_if_dirty_is(&self, num: i32, dirty: bool, expected: bool) -> ConditionalResult {
        let _guard = self.write_lock.lock();
        match self.rows.get(&num) {
            Some(entry) if entry.value().dirty == expected => {
                let created_at = entry.value().created_at;
                self.rows.insert(num, TrackingRow { dirty, created_at });
                ConditionalResult::applied()
            }
            Some(entry) => {
                ConditionalResult::rejected(Row::new(vec![CqlValue::Boolean(entry.value().dirty)]))
            }
            // a missing row makes the condition compare against null
            None => ConditionalResult::rejected(Row::new(vec![CqlValue::Null])),
        }
    }

    /// `DELETE ... IF EXISTS`
    pub(crate) fn delete_if_exists(&self, num: i32) -> ConditionalResult {
        let _guard = self.write_lock.lock();
        match self.rows.remove(&num) {
            Some(_) => ConditionalResult::applied(),
            None => ConditionalResult::rejected(Row::empty()),
        }
    }

    /// Unconditional upsert, used to seed test state.
    pub(crate) fn put(&self, num: i32, dirty: bool, created_at: DateTime<Utc>) {
        let _guard = self.write_lock.lock();
        self.rows.insert(num, TrackingRow { dirty, created_at });
    }
}
