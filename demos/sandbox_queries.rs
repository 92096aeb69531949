//! Preview writes against a throwaway database, then commit one.
//!
//! Run with: `cargo run --example sandbox_queries`

use schema_lab_sqlite::{apply_schema, run_statement, run_suite, TestCase, TestKind};

fn main() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("demo.db");

    apply_schema(
        &db,
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE);",
    )
    .expect("schema applies");

    // Previewed write: reported, then reverted.
    let preview = run_statement(&db, "INSERT INTO users (name) VALUES ('ada')", false);
    println!("preview: {}", serde_json::to_string(&preview).unwrap());

    // Committed write: durable for later calls.
    let committed = run_statement(&db, "INSERT INTO users (name) VALUES ('ada')", true);
    println!("commit:  {}", serde_json::to_string(&committed).unwrap());

    let rows = run_statement(&db, "SELECT id, name FROM users", false);
    println!("rows:    {}", serde_json::to_string(&rows).unwrap());

    // A test suite runs fully isolated; the duplicate insert fails, the
    // database keeps exactly the one committed row.
    let suite = vec![
        TestCase {
            name: "duplicate name rejected".to_string(),
            kind: TestKind::Edge,
            sql: "INSERT INTO users (name) VALUES ('ada')".to_string(),
            rationale: "UNIQUE constraint on name".to_string(),
        },
        TestCase {
            name: "fresh name accepted".to_string(),
            kind: TestKind::Normal,
            sql: "INSERT INTO users (name) VALUES ('grace')".to_string(),
            rationale: "baseline insert".to_string(),
        },
    ];
    for outcome in run_suite(&db, &suite).expect("suite runs") {
        println!("test:    {}", serde_json::to_string(&outcome).unwrap());
    }
}
