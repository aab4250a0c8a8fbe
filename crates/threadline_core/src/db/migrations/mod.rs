//! Schema migrations for the Threadline store.
//!
//! Each step is an embedded SQL file; the schema version lives in
//! `PRAGMA user_version`.
//!
//! # Invariants
//! - Steps are ordered by `version` and never renumbered.
//! - Pending steps are applied under one `IMMEDIATE` transaction whose
//!   starting version is read after the write lock is held, so two
//!   connections bootstrapping the same file cannot apply a step twice.
//! - A store written by a newer binary is refused, not downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "identities",
        sql: include_str!("0001_identities.sql"),
    },
    SchemaStep {
        version: 2,
        name: "articles",
        sql: include_str!("0002_articles.sql"),
    },
    SchemaStep {
        version: 3,
        name: "follows",
        sql: include_str!("0003_follows.sql"),
    },
];

/// Returns the schema version this binary migrates to.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the connection's schema up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if check_supported(current_user_version(conn)?, latest)? {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Another connection may have finished while we waited for the lock.
    let from_version = current_user_version(&tx)?;
    if check_supported(from_version, latest)? {
        return Ok(());
    }

    for step in SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from_version)
    {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=applied version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, latest
    );
    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

/// `Ok(true)` when `version` is current, an error when it is newer.
fn check_supported(version: u32, latest: u32) -> DbResult<bool> {
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(version == latest)
}

#[cfg(test)]
mod tests {
    use super::{check_supported, latest_version, SCHEMA_STEPS};

    #[test]
    fn steps_are_strictly_increasing_from_one() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), SCHEMA_STEPS.len() as u32);
    }

    #[test]
    fn check_supported_classifies_versions() {
        assert!(!check_supported(0, 3).unwrap());
        assert!(check_supported(3, 3).unwrap());
        assert!(check_supported(4, 3).is_err());
    }
}
