//! Error types for sandboxed SQL execution.

use thiserror::Error;

/// Errors that can occur while executing SQL against a database file.
#[derive(Debug, Error)]
pub enum ExecError {
    /// SQLite rejected an operation.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A savepoint name contained characters other than alphanumerics
    /// and underscores.
    #[error("invalid savepoint name '{0}': must contain only alphanumeric characters and underscores")]
    InvalidSavepointName(String),

    /// A test-suite file could not be decoded.
    #[error("suite error: {0}")]
    SuiteFormat(#[from] serde_json::Error),
}

impl ExecError {
    /// Whether this failure is lock contention (`SQLITE_BUSY` /
    /// `SQLITE_LOCKED`).
    ///
    /// Contention surfaces after the connection's busy timeout expires
    /// and is retryable by the caller; nothing in this crate retries
    /// internally.
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Convenience alias for results with [`ExecError`].
pub type Result<T> = std::result::Result<T, ExecError>;
