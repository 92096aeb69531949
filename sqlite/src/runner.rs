//! Declarative test suite execution.
//!
//! Runs an ordered sequence of [`TestCase`]s against a database file.
//! Each case's SQL batch executes inside its own uniquely named
//! [`Checkpoint`](crate::Checkpoint) that is **always** rolled back, so
//! test runs never mutate persisted state, and a failure in one case
//! cannot leak rows or locks into the next. One connection is reused
//! across the suite for efficiency; isolation comes from the per-case
//! checkpoints, not from reconnecting.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::executor::{open_database, run_batch};

/// Category of a test case, as authored in suite files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Expected-path behavior.
    #[default]
    Normal,
    /// Boundary or constraint-violation behavior.
    Edge,
}

/// One declared test case.
///
/// The `sql` field may contain multiple `;`-separated statements; they
/// execute as one atomic unit. `rationale` is free text for human
/// readers and is never interpreted by the engine.
///
/// Field names match the suite JSON files the surrounding application
/// stores (`name` / `type` / `sql` / `rationale`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Short description of the test.
    pub name: String,
    /// Test category.
    #[serde(rename = "type", default)]
    pub kind: TestKind,
    /// SQL to execute, possibly multiple statements.
    pub sql: String,
    /// Why the test matters. Opaque to the runner.
    #[serde(default)]
    pub rationale: String,
}

/// Pass/fail status of one executed case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Every statement in the case executed without error.
    Ok,
    /// A statement was rejected; the message is in
    /// [`TestOutcome::error`].
    Error,
}

/// Outcome of one test case, in the same order as the input suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Name copied from the input case.
    pub name: String,
    /// Kind copied from the input case.
    #[serde(rename = "type")]
    pub kind: TestKind,
    /// Whether the case passed.
    pub status: TestStatus,
    /// Captured failure message when `status` is
    /// [`TestStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Decodes a test suite from its JSON representation.
///
/// # Examples
///
/// ```
/// use schema_lab_sqlite::load_suite;
///
/// let suite = load_suite(r#"[
///     {"name": "insert a user", "type": "normal",
///      "sql": "INSERT INTO users (name) VALUES ('ada')",
///      "rationale": "baseline insert must work"}
/// ]"#).unwrap();
/// assert_eq!(suite.len(), 1);
/// ```
pub fn load_suite(json: &str) -> Result<Vec<TestCase>> {
    Ok(serde_json::from_str(json)?)
}

/// Runs a test suite against a database file.
///
/// Returns one [`TestOutcome`] per input case, in input order. The
/// database's persisted state is identical before and after the call:
/// every case is rolled back regardless of pass or fail.
///
/// # Errors
///
/// Only connection-level failures (the database file cannot be opened)
/// return `Err`; per-case failures are folded into their outcome.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use schema_lab_sqlite::{run_suite, TestCase, TestKind, TestStatus};
///
/// let suite = vec![TestCase {
///     name: "reject null name".to_string(),
///     kind: TestKind::Edge,
///     sql: "INSERT INTO users (name) VALUES (NULL)".to_string(),
///     rationale: "name is NOT NULL".to_string(),
/// }];
///
/// let outcomes = run_suite(Path::new("version.db"), &suite).unwrap();
/// assert_eq!(outcomes[0].status, TestStatus::Error);
/// ```
pub fn run_suite(path: &Path, tests: &[TestCase]) -> Result<Vec<TestOutcome>> {
    let conn = open_database(path)?;
    let mut outcomes = Vec::with_capacity(tests.len());

    for (index, case) in tests.iter().enumerate() {
        let savepoint = format!("test_sp_{index}");
        let result = run_case(&conn, &savepoint, &case.sql);
        debug!(name = %case.name, ok = result.is_ok(), "test case finished");

        outcomes.push(match result {
            Ok(()) => TestOutcome {
                name: case.name.clone(),
                kind: case.kind,
                status: TestStatus::Ok,
                error: None,
            },
            Err(e) => TestOutcome {
                name: case.name.clone(),
                kind: case.kind,
                status: TestStatus::Error,
                error: Some(e.to_string()),
            },
        });
    }

    Ok(outcomes)
}

/// Executes one case's batch under a checkpoint that is always
/// reverted.
fn run_case(conn: &rusqlite::Connection, savepoint: &str, sql: &str) -> Result<()> {
    let checkpoint = Checkpoint::new(conn, savepoint)?;
    let result = run_batch(conn, sql);
    match checkpoint.rollback() {
        Ok(()) => result,
        // Keep the execution error if there was one; otherwise surface
        // the rollback failure, since state may have leaked.
        Err(rollback_err) => result.and(Err(rollback_err)),
    }
}
