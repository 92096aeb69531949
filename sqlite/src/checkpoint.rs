//! Scoped savepoint checkpoints.
//!
//! A [`Checkpoint`] wraps a named SQLite `SAVEPOINT` as a scoped
//! resource: created on entry, guaranteed released on every exit path.
//! If neither [`commit`](Checkpoint::commit) nor
//! [`rollback`](Checkpoint::rollback) is called, dropping the value
//! rolls the savepoint back best-effort, so an early `?` return can
//! never leave a dangling transaction scope on the connection.

use rusqlite::Connection;
use tracing::warn;

use crate::error::{ExecError, Result};

/// Validates that a savepoint name is safe to splice into SQL.
pub(crate) fn validate_savepoint_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ExecError::InvalidSavepointName(name.to_string()));
    }
    Ok(())
}

/// A named nested-transaction checkpoint on one connection.
///
/// Savepoint state is connection-local; a checkpoint must never be
/// shared across connections or interleaved with another caller's
/// savepoints on the same connection.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use schema_lab_sqlite::Checkpoint;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
///
/// let cp = Checkpoint::new(&conn, "preview").unwrap();
/// conn.execute("INSERT INTO t VALUES (1)", []).unwrap();
/// cp.rollback().unwrap();
///
/// let n: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
/// assert_eq!(n, 0);
/// ```
pub struct Checkpoint<'conn> {
    conn: &'conn Connection,
    name: String,
    finished: bool,
}

impl<'conn> Checkpoint<'conn> {
    /// Opens a savepoint with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::InvalidSavepointName`] for names containing
    /// anything other than alphanumerics and underscores, or a database
    /// error if the `SAVEPOINT` statement fails.
    pub fn new(conn: &'conn Connection, name: &str) -> Result<Self> {
        validate_savepoint_name(name)?;
        conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        Ok(Self {
            conn,
            name: name.to_string(),
            finished: false,
        })
    }

    /// Releases the savepoint, keeping its effects.
    ///
    /// Releasing the outermost savepoint on an autocommit connection
    /// commits the enclosing transaction, making the effects durable.
    pub fn commit(mut self) -> Result<()> {
        self.conn
            .execute_batch(&format!("RELEASE {};", self.name))?;
        self.finished = true;
        Ok(())
    }

    /// Reverts to the savepoint, then releases it.
    ///
    /// The connection's observable state returns to what it was when
    /// the checkpoint was created.
    pub fn rollback(mut self) -> Result<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0};", self.name))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for Checkpoint<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Best-effort revert; a secondary failure here must not panic
        // (the first failure is already on its way to the caller).
        if let Err(e) = self
            .conn
            .execute_batch(&format!("ROLLBACK TO {0}; RELEASE {0};", self.name))
        {
            warn!(savepoint = %self.name, error = %e, "failed to roll back savepoint on drop");
        }
    }
}
