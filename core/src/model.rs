//! Schema model builder: raw DDL text to [`SchemaModel`].
//!
//! A pure transform over the tokenizer output. Column fragments become
//! typed [`ColumnDefinition`]s; constraint fragments are skipped as
//! columns but still contribute primary-key flags and foreign-key
//! edges. Foreign keys are matched over the entire table body rather
//! than fragment by fragment, so reformatted or multi-line constraint
//! text still matches.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::ddl::{
    self, DdlError, FragmentKind, TableBlock, classify_fragment, split_column_fragments,
};
use crate::types::{ColumnDefinition, ColumnType, ForeignKeyEdge, SchemaModel, TableDefinition};

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)FOREIGN\s+KEY\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*REFERENCES\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)",
    )
    .expect("static regex must compile")
});

static TABLE_PRIMARY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*\(([^)]*)\)").expect("static regex must compile")
});

/// Builds a [`SchemaModel`] from raw schema text.
///
/// Returns an empty model (not an error) when the text contains no
/// `CREATE TABLE` blocks; callers are expected to report that state
/// themselves.
///
/// # Errors
///
/// Returns [`DdlError`] when the tokenizer cannot balance a table
/// block. Use [`build_model_lossy`] to keep the partial model.
///
/// # Examples
///
/// ```
/// use schema_lab_core::{build_model, ColumnType};
///
/// let model = build_model(
///     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
/// ).unwrap();
///
/// let users = model.table("users").unwrap();
/// assert_eq!(users.columns.len(), 2);
/// assert!(users.columns[0].primary_key);
/// assert_eq!(users.columns[1].column_type, ColumnType::Text);
/// ```
pub fn build_model(sql: &str) -> Result<SchemaModel, DdlError> {
    let blocks = ddl::extract_table_blocks(sql)?;
    Ok(model_from_blocks(blocks))
}

/// Builds as much of a model as the input allows.
///
/// On tokenizer failure the blocks extracted before the failure still
/// become a model, so diagram rendering can proceed with partial data
/// while the error is reported alongside.
pub fn build_model_lossy(sql: &str) -> (SchemaModel, Option<DdlError>) {
    let (blocks, error) = ddl::extract_table_blocks_lossy(sql);
    (model_from_blocks(blocks), error)
}

fn model_from_blocks(blocks: Vec<TableBlock>) -> SchemaModel {
    let mut model = SchemaModel::default();

    for block in blocks {
        let table = build_table(&block);
        let mut edges = foreign_key_edges(&block);

        if let Some(previous) = model.tables.iter().position(|t| t.name == table.name) {
            // Last definition wins; keeps table names unique in the model.
            warn!(table = %table.name, "duplicate CREATE TABLE, replacing earlier definition");
            model.tables[previous] = table;
            model
                .foreign_keys
                .retain(|e| e.source_table != block.name);
        } else {
            model.tables.push(table);
        }
        model.foreign_keys.append(&mut edges);
    }

    model
}

fn build_table(block: &TableBlock) -> TableDefinition {
    let fragments = split_column_fragments(&block.body);
    let mut table = TableDefinition::new(&block.name);

    // Columns named by a table-level PRIMARY KEY (...) constraint.
    let mut constraint_pk_columns: Vec<String> = Vec::new();

    for fragment in &fragments {
        match classify_fragment(fragment) {
            FragmentKind::Column => {
                let Some((name, type_token)) = ddl::parse_column_shape(fragment) else {
                    continue;
                };
                let column_type = ColumnType::from_sql_token(&type_token);
                let is_pk = fragment.to_ascii_uppercase().contains("PRIMARY KEY");
                let mut column = ColumnDefinition::new(&name, column_type);
                if is_pk {
                    column = column.primary_key();
                }
                debug!(table = %block.name, column = %column.name, pk = column.primary_key, "adding column");
                table.columns.push(column);
            }
            FragmentKind::Constraint => {
                let upper = fragment.to_ascii_uppercase();
                if upper.contains("PRIMARY KEY") && !upper.starts_with("FOREIGN KEY") {
                    // Keyword presence alone marks the table as keyed, even
                    // if the named columns never resolve. Coarse on purpose;
                    // see TableDefinition::table_constraint_primary_key.
                    table.table_constraint_primary_key = true;
                    if let Some(captures) = TABLE_PRIMARY_KEY_RE.captures(fragment) {
                        constraint_pk_columns.extend(
                            captures[1]
                                .split(',')
                                .map(|c| c.trim().trim_matches(['`', '"']).to_string())
                                .filter(|c| !c.is_empty()),
                        );
                    }
                }
            }
            FragmentKind::Unknown => {
                debug!(table = %block.name, fragment = %fragment, "skipping unrecognized fragment");
            }
        }
    }

    for name in constraint_pk_columns {
        if let Some(column) = table.columns.iter_mut().find(|c| c.name == name) {
            column.primary_key = true;
        }
    }

    table
}

/// Scans a whole table body for `FOREIGN KEY (col) REFERENCES t(col)`
/// constraints, independent of fragment boundaries.
fn foreign_key_edges(block: &TableBlock) -> Vec<ForeignKeyEdge> {
    FOREIGN_KEY_RE
        .captures_iter(&block.body)
        .map(|captures| {
            let edge = ForeignKeyEdge {
                source_table: block.name.clone(),
                source_column: captures[1].to_string(),
                target_table: captures[2].to_string(),
                target_column: captures[3].to_string(),
            };
            debug!(
                source = %edge.source_table,
                column = %edge.source_column,
                target = %edge.target_table,
                "found foreign key"
            );
            edge
        })
        .collect()
}
