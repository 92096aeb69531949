//! Transactional SQL execution against a database file.
//!
//! Every call opens its own connection, uses it, and releases it before
//! returning; connections are never cached or shared, because savepoint
//! state is connection-local and SQLite file handles are not assumed
//! thread-safe without external serialization.
//!
//! Write statements run inside a [`Checkpoint`]; by default their
//! effects are previewed and reverted, and only an explicit
//! `commit = true` makes them durable. Failures never escape as errors:
//! [`run_statement`] folds them into [`QueryOutcome::Error`].

use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::error::Result;

/// Savepoint name used for single ad-hoc statements.
const QUERY_SAVEPOINT: &str = "query_sp";

/// Leading keywords that classify a statement as read-only.
const READ_KEYWORDS: [&str; 2] = ["select", "pragma"];

/// Whether a write went through or was reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Effects were released to the database file.
    Committed,
    /// Effects were previewed and reverted.
    RolledBack,
}

/// Result of executing one statement.
///
/// Exactly one variant per invocation. Serializes with a `type` tag so
/// the surrounding application can pass it through as JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A read statement's result set, one object per row keyed by
    /// column name.
    Rows {
        /// Column names in select order.
        columns: Vec<String>,
        /// One map per row. Duplicate column names collapse; the last
        /// value wins.
        rows: Vec<Map<String, Value>>,
    },
    /// A write statement's effect.
    Write {
        /// Rows affected, as reported by SQLite.
        affected: usize,
        /// Whether the effect was kept or reverted.
        disposition: WriteDisposition,
    },
    /// The statement was rejected; the database state is unchanged.
    Error {
        /// Storage engine message (lock contention reads as
        /// "database is locked" and is retryable by the caller).
        message: String,
    },
}

/// Opens a connection to a database file, creating it if absent.
///
/// Foreign keys are enforced and the busy timeout is set to 30 seconds;
/// contention past that surfaces as an error outcome, never a hang.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(std::time::Duration::from_secs(30))?;
    Ok(conn)
}

/// Applies schema DDL to a database file as one atomic unit.
///
/// Used when materializing a schema into a fresh database file. All
/// statements commit together or not at all.
pub fn apply_schema(path: &Path, sql: &str) -> Result<()> {
    let conn = open_database(path)?;
    let checkpoint = Checkpoint::new(&conn, "schema_sp")?;
    match conn.execute_batch(sql) {
        Ok(()) => checkpoint.commit(),
        Err(e) => {
            // Drop-rollback would also cover this; explicit is clearer.
            let _ = checkpoint.rollback();
            Err(e.into())
        }
    }
}

/// Executes a single SQL statement against a database file.
///
/// Read statements (leading keyword `select` or `pragma`) run directly
/// and return [`QueryOutcome::Rows`]. Anything else runs inside a
/// checkpoint: with `commit = false` (the default posture) the effect
/// is reported and reverted so callers can preview it; with
/// `commit = true` it is released permanently.
///
/// This function does not return `Err`: every failure, including lock
/// contention, becomes [`QueryOutcome::Error`] and the connection is
/// released on every path.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use schema_lab_sqlite::{run_statement, QueryOutcome};
///
/// let outcome = run_statement(
///     Path::new("version.db"),
///     "INSERT INTO users (name) VALUES ('ada')",
///     false,
/// );
/// assert!(matches!(outcome, QueryOutcome::Write { .. }));
/// ```
pub fn run_statement(path: &Path, sql: &str, commit: bool) -> QueryOutcome {
    match execute_statement(path, sql, commit) {
        Ok(outcome) => outcome,
        Err(e) => QueryOutcome::Error {
            message: e.to_string(),
        },
    }
}

fn execute_statement(path: &Path, sql: &str, commit: bool) -> Result<QueryOutcome> {
    let conn = open_database(path)?;

    if is_read_statement(sql) {
        debug!(sql = %sql.trim(), "running read statement");
        return read_rows(&conn, sql);
    }

    debug!(sql = %sql.trim(), commit, "running write statement");
    let checkpoint = Checkpoint::new(&conn, QUERY_SAVEPOINT)?;
    match conn.execute(sql, []) {
        Ok(affected) => {
            let disposition = if commit {
                checkpoint.commit()?;
                WriteDisposition::Committed
            } else {
                checkpoint.rollback()?;
                WriteDisposition::RolledBack
            };
            Ok(QueryOutcome::Write {
                affected,
                disposition,
            })
        }
        Err(e) => {
            // Best-effort revert; the execution error is the one worth
            // reporting.
            let _ = checkpoint.rollback();
            Ok(QueryOutcome::Error {
                message: e.to_string(),
            })
        }
    }
}

/// Classifies a statement by its leading keyword, case-insensitive.
pub fn is_read_statement(sql: &str) -> bool {
    let lower = sql.trim_start().to_ascii_lowercase();
    READ_KEYWORDS.iter().any(|k| lower.starts_with(k))
}

/// Splits `;`-delimited SQL into individual statements.
///
/// Semicolons inside single-quote, double-quote, and backtick literals
/// do not split. Empty statements are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in sql.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    statements
}

/// Runs a semicolon-delimited batch on an existing connection.
///
/// The caller owns the transaction scope; the test runner wraps each
/// batch in one checkpoint so a whole test case is atomic. Read
/// statements are executed and drained; the first failure aborts the
/// batch.
pub fn run_batch(conn: &Connection, sql: &str) -> Result<()> {
    for statement in split_statements(sql) {
        let mut stmt = conn.prepare(&statement)?;
        if stmt.column_count() > 0 {
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
        } else {
            stmt.execute([])?;
        }
    }
    Ok(())
}

fn read_rows(conn: &Connection, sql: &str) -> Result<QueryOutcome> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = Vec::new();
    let mut result = stmt.query([])?;
    while let Some(row) = result.next()? {
        let mut values = Map::new();
        for (i, column) in columns.iter().enumerate() {
            values.insert(column.clone(), value_to_json(row.get_ref(i)?));
        }
        rows.push(values);
    }

    Ok(QueryOutcome::Rows { columns, rows })
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        // JSON has no byte type; blobs degrade to lossy text.
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_classification_is_case_insensitive_and_trimmed() {
        assert!(is_read_statement("SELECT * FROM t"));
        assert!(is_read_statement("  select 1"));
        assert!(is_read_statement("PRAGMA table_info(t)"));
        assert!(!is_read_statement("INSERT INTO t VALUES (1)"));
        assert!(!is_read_statement("UPDATE t SET a = 1"));
        assert!(!is_read_statement("DELETE FROM t"));
    }

    #[test]
    fn test_split_statements_drops_empties() {
        let statements = split_statements("INSERT INTO t VALUES (1); ; SELECT 1;");
        assert_eq!(statements, vec!["INSERT INTO t VALUES (1)", "SELECT 1"]);
    }

    #[test]
    fn test_split_statements_ignores_semicolons_in_literals() {
        let statements = split_statements("INSERT INTO t VALUES ('a;b'); SELECT 1");
        assert_eq!(
            statements,
            vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]
        );
    }

    #[test]
    fn test_query_outcome_serializes_with_type_tag() {
        let outcome = QueryOutcome::Write {
            affected: 2,
            disposition: WriteDisposition::RolledBack,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["type"], "write");
        assert_eq!(value["affected"], 2);
        assert_eq!(value["disposition"], "rolled_back");
    }

    #[test]
    fn test_run_batch_executes_reads_and_writes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
        run_batch(
            &conn,
            "INSERT INTO t VALUES (1); SELECT * FROM t; INSERT INTO t VALUES (2);",
        )
        .unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_run_batch_stops_on_first_failure() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
        let result = run_batch(&conn, "INSERT INTO t VALUES (1); INSERT INTO nope VALUES (2);");
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_serialize_as_objects_keyed_by_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT);
             INSERT INTO t VALUES (1, 'ada');",
        )
        .unwrap();

        let outcome = read_rows(&conn, "SELECT id, name FROM t").unwrap();
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["type"], "rows");
        assert_eq!(value["columns"], json!(["id", "name"]));
        assert_eq!(value["rows"][0]["id"], 1);
        assert_eq!(value["rows"][0]["name"], "ada");
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(value_to_json(ValueRef::Null), Value::Null);
        assert_eq!(value_to_json(ValueRef::Integer(42)), json!(42));
        assert_eq!(value_to_json(ValueRef::Real(1.5)), json!(1.5));
        assert_eq!(
            value_to_json(ValueRef::Text(b"hi")),
            Value::String("hi".to_string())
        );
    }
}
