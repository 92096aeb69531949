//! Mermaid ER diagram rendering.
//!
//! A pure function from [`SchemaModel`] to Mermaid `erDiagram` text.
//! Entities list their attributes as `(type, name[, PK])` in declaration
//! order; every foreign-key edge renders as one many-to-one relationship
//! line. The renderer never fails: an empty model produces a fixed
//! placeholder diagram instead of invalid syntax.
//!
//! # Examples
//!
//! ```
//! use schema_lab_core::{build_model, render_mermaid};
//!
//! let model = build_model("CREATE TABLE users (id INTEGER PRIMARY KEY);").unwrap();
//! let diagram = render_mermaid(&model);
//! assert!(diagram.starts_with("erDiagram"));
//! assert!(diagram.contains("int id PK"));
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::types::SchemaModel;

/// Matches a relationship line, splitting the `entity }o--|| entity : `
/// prefix from the label.
static RELATION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*\w+\s+[}o|]{1,2}--[|{}]{1,2}\s+\w+\s*:\s*)(.*)$")
        .expect("static regex must compile")
});

/// Diagram emitted when no table blocks were detected upstream.
const PLACEHOLDER: &str = "erDiagram\n    ErrorTable {\n        string error\n    }\n    ErrorTable ||--|| ErrorTable : none";

/// Renders a schema model as Mermaid `erDiagram` text.
///
/// Relationship lines are deduplicated (the same source entity never
/// repeats an identical rendered line) and carry the fixed many-to-one
/// marker `}o--||` regardless of uniqueness constraints on the target.
/// The full text is passed through [`fix_relation_labels`] before being
/// returned.
pub fn render_mermaid(model: &SchemaModel) -> String {
    if model.is_empty() {
        return PLACEHOLDER.to_string();
    }

    let mut lines = vec!["erDiagram".to_string()];

    for table in &model.tables {
        lines.push(format!("    {} {{", table.name));
        for column in &table.columns {
            let mut line = format!(
                "        {} {}",
                column.column_type.mermaid_name(),
                column.name
            );
            if column.primary_key {
                line.push_str(" PK");
            }
            lines.push(line);
        }
        lines.push("    }".to_string());
    }

    let mut relationships: Vec<String> = Vec::new();
    for edge in &model.foreign_keys {
        let line = format!(
            "    {} }}o--|| {} : {} to {}",
            edge.source_table, edge.target_table, edge.source_column, edge.target_column
        );
        if !relationships.contains(&line) {
            relationships.push(line);
        }
    }
    lines.extend(relationships);

    fix_relation_labels(&lines.join("\n"))
}

/// Normalizes relationship labels over fully rendered diagram text.
///
/// Mermaid relationship labels cannot contain unquoted whitespace, so
/// any label with multiple whitespace-separated tokens is truncated to
/// its first token. Runs as a post-process over the whole text because
/// label text may originate upstream of this crate.
pub fn fix_relation_labels(diagram: &str) -> String {
    diagram
        .lines()
        .map(|line| match RELATION_LINE_RE.captures(line) {
            Some(captures) => {
                let label = captures[2].trim();
                match label.split_whitespace().next() {
                    Some(first) => format!("{}{}", &captures[1], first),
                    None => line.to_string(),
                }
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
