//! Embedded schema migrations for the task store.
//!
//! Each step is an SQL file compiled into the binary and identified by the
//! schema version it produces. The applied version lives in
//! `PRAGMA user_version`; a database that reports a version above
//! `latest_version()` was written by a newer build and is refused.
//!
//! Pending steps run in one immediate transaction, and the version is read
//! again inside it, so pooled connections opening the same file at once
//! apply each step exactly once.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "tasks",
    sql: include_str!("0001_init.sql"),
}];

/// Schema version produced by the last embedded step.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the connected database up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if ensure_supported(current_user_version(conn)?)? == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = ensure_supported(current_user_version(&tx)?)?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        debug!(
            "event=db_migrate module=db status=step version={} name={}",
            step.version, step.name
        );
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    if from < latest {
        info!("event=db_migrate module=db status=ok from={from} to={latest}");
    }
    Ok(())
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

fn ensure_supported(version: u32) -> DbResult<u32> {
    let latest = latest_version();
    if version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: latest,
        });
    }
    Ok(version)
}
