//! SQLite storage implementation.

mod contexts;
mod conversations;
mod messages;
mod profiles;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::StorageError;
use crate::migrations;

/// Single-connection SQLite store behind a mutex. Suspension points never
/// hold the guard, so the mutex only serializes the synchronous statement
/// executions themselves.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }
}

pub(crate) fn lock_conn(
    mutex: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, StorageError> {
    mutex
        .lock()
        .map_err(|e: PoisonError<_>| StorageError::LockPoisoned(e.to_string()))
}

impl Storage {
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        lock_conn(&self.conn)
    }
}

pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn opt_ts(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(ts)
}

pub(crate) fn parse_ts(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_ts).transpose()
}
