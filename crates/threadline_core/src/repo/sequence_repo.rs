//! Named monotonic counters backed by `sequence_counters`.
//!
//! # Responsibility
//! - Provide the store's increment-and-fetch primitive.
//!
//! # Invariants
//! - A counter is created lazily at 0 and the first allocation returns 1.
//! - Increment and read happen in one statement; no value is handed out twice.
//! - Allocation never takes application-level locks.

use crate::repo::error::RepoResult;
use crate::repo::schema::ensure_connection_ready;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for named counters.
pub trait SequenceRepository {
    /// Atomically increments `name` and returns the new value.
    fn next_value(&self, name: &str) -> RepoResult<i64>;
    /// Returns the last allocated value, if the counter exists.
    fn current_value(&self, name: &str) -> RepoResult<Option<i64>>;
}

/// SQLite-backed counter repository.
pub struct SqliteSequenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSequenceRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["sequence_counters"])?;
        Ok(Self { conn })
    }
}

impl SequenceRepository for SqliteSequenceRepository<'_> {
    fn next_value(&self, name: &str) -> RepoResult<i64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = increment_and_fetch(&tx, name)?;
        tx.commit()?;
        Ok(value)
    }

    fn current_value(&self, name: &str) -> RepoResult<Option<i64>> {
        let value = self
            .conn
            .query_row(
                "SELECT seq FROM sequence_counters WHERE name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// Increments `name` on `conn` and returns the new value.
///
/// Callers that persist an entity with the value must run this inside the
/// same transaction as the insert, so a failed insert releases the number.
pub(crate) fn increment_and_fetch(conn: &Connection, name: &str) -> RepoResult<i64> {
    let value = conn.query_row(
        "INSERT INTO sequence_counters (name, seq)
         VALUES (?1, 1)
         ON CONFLICT(name) DO UPDATE SET seq = seq + 1
         RETURNING seq;",
        [name],
        |row| row.get(0),
    )?;
    Ok(value)
}
