//! Scoped SQLite access with commit/rollback discipline.
//!
//! Every acquisition opens its own connection, runs the caller's body inside a
//! transaction, and closes the connection before returning. Read-only scopes
//! always roll back, even when the body mutated something.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whether a scope may commit its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Connection factory for the configured database file.
#[derive(Debug, Clone)]
pub struct AccessGate {
    path: PathBuf,
}

impl AccessGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `body` against a fresh connection.
    ///
    /// The file is never created: a missing database is an open error.
    pub fn acquire<T, E, F>(&self, access: Access, body: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let outcome = {
            let tx = conn.transaction()?;
            match body(&tx) {
                Ok(value) => match access {
                    Access::ReadWrite => tx.commit().map(|_| value).map_err(E::from),
                    Access::ReadOnly => tx.rollback().map(|_| value).map_err(E::from),
                },
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback() {
                        warn!("Rollback after failed scope also failed: {}", rollback_err);
                    }
                    Err(err)
                }
            }
        };

        if let Err((_, close_err)) = conn.close() {
            warn!("Failed to close database connection: {}", close_err);
        }
        debug!("Released {:?} scope on {}", access, self.path.display());
        outcome
    }
}
