//! Integration tests for the schema-lab-sqlite crate.
//!
//! These exercise real database files in temp directories: rollback
//! idempotence, commit durability, and test-suite isolation.

use std::path::{Path, PathBuf};

use schema_lab_sqlite::{
    QueryOutcome, TestCase, TestKind, TestStatus, WriteDisposition, apply_schema,
    run_statement, run_suite,
};
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        total REAL,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );";

fn fresh_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("version.db");
    apply_schema(&path, SCHEMA).expect("schema must apply");
    path
}

fn count(path: &Path, table: &str) -> i64 {
    match run_statement(path, &format!("SELECT COUNT(*) AS n FROM {table}"), false) {
        QueryOutcome::Rows { rows, .. } => rows[0]["n"].as_i64().unwrap(),
        other => panic!("expected rows, got {other:?}"),
    }
}

fn case(name: &str, kind: TestKind, sql: &str) -> TestCase {
    TestCase {
        name: name.to_string(),
        kind,
        sql: sql.to_string(),
        rationale: String::new(),
    }
}

#[test]
fn test_read_statement_returns_rows_with_column_names() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);
    run_statement(&db, "INSERT INTO users (name) VALUES ('ada')", true);

    let outcome = run_statement(&db, "SELECT id, name FROM users", false);
    match outcome {
        QueryOutcome::Rows { columns, rows } => {
            assert_eq!(columns, vec!["id", "name"]);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["name"], serde_json::json!("ada"));
        }
        other => panic!("expected rows, got {other:?}"),
    }
}

#[test]
fn test_rollback_leaves_database_state_unchanged() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let before = count(&db, "users");
    let outcome = run_statement(&db, "INSERT INTO users (name) VALUES ('ada')", false);
    assert_eq!(
        outcome,
        QueryOutcome::Write {
            affected: 1,
            disposition: WriteDisposition::RolledBack,
        }
    );
    assert_eq!(count(&db, "users"), before);
}

#[test]
fn test_commit_persists_for_subsequent_calls() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let outcome = run_statement(&db, "INSERT INTO users (name) VALUES ('ada')", true);
    assert_eq!(
        outcome,
        QueryOutcome::Write {
            affected: 1,
            disposition: WriteDisposition::Committed,
        }
    );
    // A fresh connection in a later call observes the write.
    assert_eq!(count(&db, "users"), 1);
}

#[test]
fn test_failed_statement_reports_error_without_mutation() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let outcome = run_statement(&db, "INSERT INTO nonexistent VALUES (1)", true);
    assert!(matches!(outcome, QueryOutcome::Error { .. }));
    assert_eq!(count(&db, "users"), 0);
}

#[test]
fn test_pragma_runs_as_read() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let outcome = run_statement(&db, "PRAGMA table_info(users)", false);
    match outcome {
        QueryOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 2),
        other => panic!("expected rows, got {other:?}"),
    }
}

#[test]
fn test_suite_outcomes_match_input_order_and_length() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let suite = vec![
        case("insert user", TestKind::Normal, "INSERT INTO users (name) VALUES ('ada')"),
        case("select users", TestKind::Normal, "SELECT * FROM users"),
        case("bad table", TestKind::Edge, "INSERT INTO missing VALUES (1)"),
    ];

    let outcomes = run_suite(&db, &suite).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].name, "insert user");
    assert_eq!(outcomes[0].status, TestStatus::Ok);
    assert_eq!(outcomes[1].status, TestStatus::Ok);
    assert_eq!(outcomes[2].status, TestStatus::Error);
    assert!(outcomes[2].error.as_deref().unwrap().contains("missing"));
}

#[test]
fn test_suite_never_mutates_persisted_state() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let suite = vec![case(
        "insert then verify",
        TestKind::Normal,
        "INSERT INTO users (name) VALUES ('ada'); SELECT * FROM users;",
    )];
    let outcomes = run_suite(&db, &suite).unwrap();
    assert_eq!(outcomes[0].status, TestStatus::Ok);
    assert_eq!(count(&db, "users"), 0);
}

#[test]
fn test_failing_case_does_not_leak_into_next_case() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let suite = vec![
        case("setup rows", TestKind::Normal, "INSERT INTO users (name) VALUES ('ada')"),
        case("select fine", TestKind::Normal, "SELECT * FROM users"),
        // Violates UNIQUE mid-batch: first insert succeeds inside the
        // checkpoint, second fails, whole case must revert.
        case(
            "constraint violation",
            TestKind::Edge,
            "INSERT INTO users (name) VALUES ('bob');
             INSERT INTO users (name) VALUES ('bob');",
        ),
        case("still empty", TestKind::Normal, "INSERT INTO users (name) VALUES ('bob')"),
    ];

    let outcomes = run_suite(&db, &suite).unwrap();
    assert_eq!(outcomes[2].status, TestStatus::Error);
    // Test 4 runs against a clean slate: 'bob' from test 3 is gone.
    assert_eq!(outcomes[3].status, TestStatus::Ok);
    // Nothing committed from any case.
    assert_eq!(count(&db, "users"), 0);
}

#[test]
fn test_foreign_key_enforcement_is_on() {
    let dir = TempDir::new().unwrap();
    let db = fresh_db(&dir);

    let outcome = run_statement(
        &db,
        "INSERT INTO orders (user_id, total) VALUES (99, 10.0)",
        true,
    );
    assert!(matches!(outcome, QueryOutcome::Error { .. }));
}

#[test]
fn test_apply_schema_is_atomic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.db");

    let result = apply_schema(
        &path,
        "CREATE TABLE a (id INTEGER PRIMARY KEY);
         CREATE TABLE b (id INTEGER PRIMARY KEY nonsense);",
    );
    assert!(result.is_err());

    // The first table must not survive the failed batch.
    let outcome = run_statement(&path, "SELECT * FROM a", false);
    assert!(matches!(outcome, QueryOutcome::Error { .. }));
}

#[test]
fn test_run_statement_on_unreadable_path_is_error_outcome() {
    let outcome = run_statement(
        Path::new("/nonexistent-dir/nope.db"),
        "SELECT 1",
        false,
    );
    assert!(matches!(outcome, QueryOutcome::Error { .. }));
}
