//! Savepoint-isolated SQL execution for schema-lab.
//!
//! This crate runs ad-hoc SQL statements and declarative test suites
//! against SQLite database files without risking persisted state: every
//! write executes inside a named savepoint checkpoint that is reverted
//! unless the caller explicitly opts into commit, and test suites are
//! always reverted.
//!
//! # Architecture
//!
//! - **`checkpoint`**: [`Checkpoint`], a scoped savepoint resource with
//!   guaranteed release-with-rollback on every exit path
//! - **`executor`**: connection handling, statement classification,
//!   [`run_statement`] / [`apply_schema`] / batch execution
//! - **`runner`**: [`run_suite`] over [`TestCase`] sequences with
//!   per-case isolation
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use schema_lab_sqlite::{apply_schema, run_statement, QueryOutcome};
//!
//! let db = Path::new("version.db");
//! apply_schema(db, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);").unwrap();
//!
//! // Preview a write without persisting it.
//! let outcome = run_statement(db, "INSERT INTO users (name) VALUES ('ada')", false);
//! assert!(matches!(outcome, QueryOutcome::Write { .. }));
//! ```
//!
//! # Concurrency
//!
//! Connections are scoped to one logical operation and never cached.
//! Callers invoking this crate concurrently against the *same* file
//! must serialize externally; different files need no coordination.

mod checkpoint;
mod error;
mod executor;
mod runner;

pub use checkpoint::Checkpoint;
pub use error::{ExecError, Result};
pub use executor::{
    QueryOutcome, WriteDisposition, apply_schema, is_read_statement, open_database,
    run_batch, run_statement, split_statements,
};
pub use runner::{TestCase, TestKind, TestOutcome, TestStatus, load_suite, run_suite};
