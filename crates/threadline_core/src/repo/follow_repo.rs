//! Follow-graph repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store the directed "follows" relation as one row per edge.
//! - Expose set-add/set-remove primitives with affected-row feedback.
//!
//! # Invariants
//! - `(follower_key, followee_key)` is unique; adding an existing edge is a no-op.
//! - Self-edges are rejected by the schema `CHECK`.
//! - Cycles are allowed; the graph carries no acyclicity assumption.

use crate::model::identity::IdentityKey;
use crate::repo::error::RepoResult;
use crate::repo::schema::ensure_connection_ready;
use rusqlite::{params, Connection};

/// Repository interface for follow edges.
pub trait FollowRepository {
    /// Adds an edge. Returns `false` when it already existed.
    fn add_follow(&self, follower: IdentityKey, followee: IdentityKey) -> RepoResult<bool>;
    /// Removes an edge. Returns `false` when there was nothing to remove.
    fn remove_follow(&self, follower: IdentityKey, followee: IdentityKey) -> RepoResult<bool>;
    /// Display names followed by `follower`, sorted ascending.
    fn list_following_names(&self, follower: IdentityKey) -> RepoResult<Vec<String>>;
}

/// SQLite-backed follow repository.
pub struct SqliteFollowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFollowRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["identities", "follows"])?;
        Ok(Self { conn })
    }
}

impl FollowRepository for SqliteFollowRepository<'_> {
    fn add_follow(&self, follower: IdentityKey, followee: IdentityKey) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO follows (follower_key, followee_key)
             VALUES (?1, ?2);",
            params![follower.to_string(), followee.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn remove_follow(&self, follower: IdentityKey, followee: IdentityKey) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM follows
             WHERE follower_key = ?1
               AND followee_key = ?2;",
            params![follower.to_string(), followee.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn list_following_names(&self, follower: IdentityKey) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.display_name
             FROM follows f
             INNER JOIN identities i ON i.identity_key = f.followee_key
             WHERE f.follower_key = ?1
             ORDER BY i.display_name ASC;",
        )?;
        let mut rows = stmt.query([follower.to_string()])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }
}
