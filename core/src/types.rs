//! Entity-relationship model types for parsed SQL schemas.
//!
//! This module defines the data model produced by the DDL parser and
//! consumed by the validator and the diagram renderer. The types are
//! designed for serialization with [`serde`] so the surrounding
//! application can persist and transport models as JSON.
//!
//! A [`SchemaModel`] is built once per parse call and never mutated
//! afterwards; any schema edit produces a new model.

use serde::{Deserialize, Serialize};

/// Semantic column type mapped from a raw SQL type token.
///
/// The mapping is deliberately lossy: any token that is not one of the
/// four recognized SQLite types falls back to [`ColumnType::Other`],
/// which renders as `string` in diagrams. This fallback is a
/// compatibility policy, not an oversight: downstream consumers rely
/// on unknown types degrading to text.
///
/// # Examples
///
/// ```
/// use schema_lab_core::ColumnType;
///
/// assert_eq!(ColumnType::from_sql_token("INTEGER"), ColumnType::Integer);
/// assert_eq!(ColumnType::from_sql_token("text"), ColumnType::Text);
///
/// let other = ColumnType::from_sql_token("DECIMAL(10,2)");
/// assert_eq!(other.mermaid_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// SQLite `INTEGER`.
    Integer,
    /// SQLite `TEXT`.
    Text,
    /// SQLite `REAL`.
    Real,
    /// SQLite `DATETIME`.
    DateTime,
    /// Any unrecognized type token, kept verbatim.
    Other(String),
}

impl ColumnType {
    /// Maps a raw SQL type token to a semantic type.
    ///
    /// Matching is case-insensitive and exact; `VARCHAR(255)` or
    /// `DECIMAL(10,2)` are not decomposed, they map to
    /// [`ColumnType::Other`] as a whole.
    pub fn from_sql_token(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "INTEGER" => Self::Integer,
            "TEXT" => Self::Text,
            "REAL" => Self::Real,
            "DATETIME" => Self::DateTime,
            // Lossy fallback: unknown types degrade to text-like.
            _ => Self::Other(token.to_string()),
        }
    }

    /// Returns the Mermaid attribute type name for this column type.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_lab_core::ColumnType;
    ///
    /// assert_eq!(ColumnType::Integer.mermaid_name(), "int");
    /// assert_eq!(ColumnType::Other("BLOB".into()).mermaid_name(), "string");
    /// ```
    pub fn mermaid_name(&self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Text => "string",
            Self::Real => "float",
            Self::DateTime => "datetime",
            Self::Other(_) => "string",
        }
    }
}

/// A single column extracted from a `CREATE TABLE` body.
///
/// Immutable once built. The primary-key flag may come from the
/// column's own fragment (`id INTEGER PRIMARY KEY`) or from a
/// table-level `PRIMARY KEY (...)` constraint that names the column.
///
/// # Examples
///
/// ```
/// use schema_lab_core::{ColumnDefinition, ColumnType};
///
/// let id = ColumnDefinition::new("id", ColumnType::Integer).primary_key();
/// assert!(id.primary_key);
/// assert_eq!(id.name, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column identifier as declared.
    pub name: String,
    /// Mapped semantic type.
    pub column_type: ColumnType,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
}

impl ColumnDefinition {
    /// Creates a non-primary-key column.
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            primary_key: false,
        }
    }

    /// Marks the column as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A directed foreign-key edge between two tables.
///
/// The FK side is treated as "many" and the referenced side as "one"
/// for diagram rendering, regardless of uniqueness constraints on the
/// target, a fixed cardinality policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// Table declaring the `FOREIGN KEY` constraint.
    pub source_table: String,
    /// Referencing column in the source table.
    pub source_column: String,
    /// Referenced table name.
    pub target_table: String,
    /// Referenced column in the target table.
    pub target_column: String,
}

/// A table definition: name plus columns in declaration order.
///
/// # Examples
///
/// ```
/// use schema_lab_core::{ColumnDefinition, ColumnType, TableDefinition};
///
/// let table = TableDefinition::new("users")
///     .with_column(ColumnDefinition::new("id", ColumnType::Integer).primary_key())
///     .with_column(ColumnDefinition::new("name", ColumnType::Text));
///
/// assert!(table.has_primary_key());
/// assert_eq!(table.columns.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table identifier as declared.
    pub name: String,
    /// Columns in declaration order (preserved for rendering).
    pub columns: Vec<ColumnDefinition>,
    /// True when the table body carried a table-level `PRIMARY KEY (...)`
    /// constraint, whether or not it named a real column. Keyword
    /// presence alone counts, a coarse heuristic kept for compatibility
    /// with existing validation results.
    #[serde(default)]
    pub table_constraint_primary_key: bool,
}

impl TableDefinition {
    /// Creates an empty table definition with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends a column, preserving declaration order.
    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Whether any column is flagged primary key, or a table-level
    /// `PRIMARY KEY` constraint was present.
    pub fn has_primary_key(&self) -> bool {
        self.table_constraint_primary_key || self.columns.iter().any(|c| c.primary_key)
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A complete parsed schema: tables in document order plus all
/// foreign-key edges collected across them.
///
/// Table names are unique within a model (a duplicate `CREATE TABLE`
/// replaces the earlier definition during the build). Lookup is a
/// linear scan; schemas in this domain hold tens of tables, not
/// thousands.
///
/// # Examples
///
/// ```
/// use schema_lab_core::build_model;
///
/// let model = build_model("CREATE TABLE users (id INTEGER PRIMARY KEY);").unwrap();
/// assert_eq!(model.tables.len(), 1);
/// assert!(model.contains_table("users"));
/// assert!(model.foreign_keys.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    /// Tables in the order they appear in the source text.
    pub tables: Vec<TableDefinition>,
    /// Every foreign-key edge found in the schema.
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl SchemaModel {
    /// Finds a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Whether a table with the given name exists in the model.
    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// True when no table blocks were extracted from the source.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_mapping() {
        assert_eq!(ColumnType::from_sql_token("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_token("TEXT"), ColumnType::Text);
        assert_eq!(ColumnType::from_sql_token("Real"), ColumnType::Real);
        assert_eq!(ColumnType::from_sql_token("DATETIME"), ColumnType::DateTime);
        assert_eq!(
            ColumnType::from_sql_token("VARCHAR(255)"),
            ColumnType::Other("VARCHAR(255)".to_string())
        );
    }

    #[test]
    fn test_unknown_type_renders_as_string() {
        assert_eq!(ColumnType::from_sql_token("BLOB").mermaid_name(), "string");
        assert_eq!(
            ColumnType::from_sql_token("DECIMAL(10,2)").mermaid_name(),
            "string"
        );
    }

    #[test]
    fn test_table_primary_key_detection() {
        let table = TableDefinition::new("users")
            .with_column(ColumnDefinition::new("id", ColumnType::Integer));
        assert!(!table.has_primary_key());

        let table = TableDefinition::new("users")
            .with_column(ColumnDefinition::new("id", ColumnType::Integer).primary_key());
        assert!(table.has_primary_key());
    }

    #[test]
    fn test_table_level_constraint_counts_as_primary_key() {
        let mut table = TableDefinition::new("pairs")
            .with_column(ColumnDefinition::new("a", ColumnType::Integer));
        table.table_constraint_primary_key = true;
        assert!(table.has_primary_key());
    }

    #[test]
    fn test_model_lookup() {
        let model = SchemaModel {
            tables: vec![TableDefinition::new("users")],
            foreign_keys: Vec::new(),
        };
        assert!(model.contains_table("users"));
        assert!(!model.contains_table("orders"));
        assert!(model.table("users").is_some());
    }
}
