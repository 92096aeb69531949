//! Parse a schema, validate it, and print the Mermaid diagram.
//!
//! Run with: `cargo run --example render_diagram`

use schema_lab_core::{build_model, render_mermaid, validate_schema};

fn main() {
    let sql = "
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            joined_at DATETIME
        );
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            total REAL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );";

    let model = build_model(sql).expect("schema parses");

    println!("validation findings:");
    for finding in validate_schema(&model) {
        println!("  [{:?}] {}", finding.severity, finding.message);
    }

    println!("\n{}", render_mermaid(&model));
}
