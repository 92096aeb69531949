//! Core schema modeling for schema-lab.
//!
//! This crate turns raw `CREATE TABLE` DDL text into a typed
//! entity-relationship model and offers two independent consumers of
//! that model: a static validator and a Mermaid diagram renderer.
//! Neither consumer mutates the model; both can run over the same
//! parse result.
//!
//! # Architecture
//!
//! - **`ddl`**: tokenizer (comment stripping, block extraction,
//!   depth-tracked fragment splitting)
//! - **`model`**: builder, turning fragments into typed tables, columns,
//!   and foreign-key edges
//! - **`validate`**: static checks producing severity-tagged findings
//! - **`diagram`**: Mermaid `erDiagram` rendering
//!
//! # Quick start
//!
//! ```
//! use schema_lab_core::{build_model, render_mermaid, validate_schema, Severity};
//!
//! let sql = "
//!     CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
//!     CREATE TABLE orders (
//!         id INTEGER PRIMARY KEY,
//!         user_id INTEGER,
//!         FOREIGN KEY (user_id) REFERENCES users(id)
//!     );";
//!
//! let model = build_model(sql).unwrap();
//! assert_eq!(model.tables.len(), 2);
//!
//! let findings = validate_schema(&model);
//! assert_eq!(findings[0].severity, Severity::Success);
//!
//! let diagram = render_mermaid(&model);
//! assert!(diagram.contains("orders }o--|| users"));
//! ```

mod ddl;
mod diagram;
mod model;
mod types;
mod validate;

pub use ddl::{
    DdlError, FragmentKind, TableBlock, classify_fragment, extract_table_blocks,
    extract_table_blocks_lossy, normalize_sql, split_column_fragments,
};
pub use diagram::{fix_relation_labels, render_mermaid};
pub use model::{build_model, build_model_lossy};
pub use types::{
    ColumnDefinition, ColumnType, ForeignKeyEdge, SchemaModel, TableDefinition,
};
pub use validate::{Severity, ValidationFinding, validate_ddl, validate_schema};
