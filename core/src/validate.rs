//! Static schema validation.
//!
//! Runs independent checks over a built [`SchemaModel`]: missing
//! primary keys, dangling foreign-key references, and naming-convention
//! warnings. A validation pass always produces at least one finding:
//! a clean pass emits a single success record so callers can tell
//! "validated clean" from "not yet validated".
//!
//! # Examples
//!
//! ```
//! use schema_lab_core::{validate_ddl, Severity};
//!
//! let findings = validate_ddl("CREATE TABLE users (id INTEGER PRIMARY KEY);");
//! assert_eq!(findings.len(), 1);
//! assert_eq!(findings[0].severity, Severity::Success);
//!
//! let findings = validate_ddl("CREATE TABLE users (name TEXT);");
//! assert!(findings.iter().any(|f| f.severity == Severity::Error));
//! ```

use serde::{Deserialize, Serialize};

use crate::model::build_model;
use crate::types::SchemaModel;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Schema problem that should block acceptance.
    Error,
    /// Advisory; the schema remains usable.
    Warning,
    /// Emitted exactly once when a pass found nothing to report.
    Success,
}

/// One finding from a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// How serious the finding is.
    pub severity: Severity,
    /// Offending table, when the finding is table-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ValidationFinding {
    fn error(table: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            table: table.map(String::from),
            message,
        }
    }

    fn warning(table: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            table: Some(table.to_string()),
            message,
        }
    }

    fn success() -> Self {
        Self {
            severity: Severity::Success,
            table: None,
            message: "All static checks passed!".to_string(),
        }
    }
}

/// Validates raw DDL text, parsing it first.
///
/// This is the front door used by applications: tokenizer failures are
/// reported as a single error finding carrying the parser's message,
/// and an input with no `CREATE TABLE` blocks is itself an error
/// finding, never a panic or a raw error crossing the boundary.
pub fn validate_ddl(sql: &str) -> Vec<ValidationFinding> {
    let model = match build_model(sql) {
        Ok(model) => model,
        Err(e) => {
            return vec![ValidationFinding::error(
                None,
                format!("Schema Parsing Error: {e}"),
            )];
        }
    };

    if model.is_empty() {
        return vec![ValidationFinding::error(
            None,
            "SQL schema is empty or could not be parsed.".to_string(),
        )];
    }

    validate_schema(&model)
}

/// Validates a built model.
///
/// Two passes: the first collects per-table facts (primary-key
/// presence, naming), the second checks them and the foreign-key edges.
/// Findings are ordered: warnings from pass one, then pass-two errors
/// in model order.
///
/// # Examples
///
/// ```
/// use schema_lab_core::{build_model, validate_schema, Severity};
///
/// let model = build_model(
///     "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER,
///      FOREIGN KEY (user_id) REFERENCES users(id));",
/// ).unwrap();
///
/// let findings = validate_schema(&model);
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].severity, Severity::Error);
/// assert!(findings[0].message.contains("users"));
/// ```
pub fn validate_schema(model: &SchemaModel) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    // Pass 1: per-table facts.
    for table in &model.tables {
        if table.name.chars().any(|c| c.is_uppercase()) {
            findings.push(ValidationFinding::warning(
                &table.name,
                format!(
                    "Naming Convention: Table '{}' is not in lowercase.",
                    table.name
                ),
            ));
        }
    }

    // Pass 2: primary keys, then dangling references.
    for table in &model.tables {
        if !table.has_primary_key() {
            findings.push(ValidationFinding::error(
                Some(table.name.as_str()),
                format!(
                    "Missing Primary Key: Table '{}' does not have a PRIMARY KEY defined.",
                    table.name
                ),
            ));
        }
    }

    for edge in &model.foreign_keys {
        if !model.contains_table(&edge.target_table) {
            findings.push(ValidationFinding::error(
                Some(edge.source_table.as_str()),
                format!(
                    "Invalid Foreign Key: Table '{}' has a FOREIGN KEY that references a non-existent table '{}'.",
                    edge.source_table, edge.target_table
                ),
            ));
        }
    }

    if findings.is_empty() {
        findings.push(ValidationFinding::success());
    }

    findings
}
